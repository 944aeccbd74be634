//! The layer view-state machine.
//!
//! Given a requested (city, pollutant, year, month) or an opacity-control
//! event, decides what to fetch, what to materialize on the rendering
//! surface, what to evict and what to leave untouched. The transition table
//! is a pure function ([`plan`]); [`engine::ViewEngine`] is the thin async
//! adapter that executes its effects.

pub mod engine;
pub mod plan;
pub mod state;
pub mod surface;

pub use engine::{EngineConfig, ViewEngine};
pub use plan::{plan, Effect, ViewRequest};
pub use state::{LoadedState, MaterializeMode, SliderDomain, ViewState};
pub use surface::{ids, LayerKind, LayerSpec, MapSurface, RecordingSurface, SurfaceOp};
