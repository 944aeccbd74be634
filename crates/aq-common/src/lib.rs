//! Common types and utilities shared across the air-quality map engine.

pub mod corners;
pub mod error;
pub mod layer;
pub mod period;
pub mod pollutant;

pub use corners::DisplayCorners;
pub use error::{AqError, AqResult};
pub use layer::{LayerKey, LayerSelection};
pub use period::PeriodKey;
pub use pollutant::Pollutant;
