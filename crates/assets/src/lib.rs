//! Asset retrieval and caching for the air-quality map engine.
//!
//! Covers the external data contracts produced by the offline pipeline:
//! consolidated bounds descriptors, per-month raster images and station
//! feature collections, all reached through the [`AssetSource`] seam.

pub mod bounds;
pub mod layout;
pub mod raster_cache;
pub mod source;
pub mod stations;

pub use bounds::{BoundsResolver, PollutantScale, ResolvedBounds};
pub use raster_cache::RasterCache;
pub use source::{AssetSource, HttpAssetSource, LocalAssetSource};
pub use stations::StationStore;
