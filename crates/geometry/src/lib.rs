//! Pure geometry and projection algorithms for map layer placement.
//!
//! Everything here is side-effect free and synchronous: ring winding,
//! point-in-polygon tests, inverse-mask construction and Web Mercator
//! conversion over GeoJSON-shaped feature collections.

pub mod contains;
pub mod feature;
pub mod mask;
pub mod mercator;
pub mod winding;

pub use contains::{is_point_in_region, point_in_polygon};
pub use feature::{Feature, FeatureCollection, Geometry};
pub use mask::build_inverse_mask;
pub use mercator::{detect_and_reproject, lon_lat_to_web_mercator, web_mercator_to_lon_lat};
pub use winding::{ensure_winding, signed_area};

/// A ring of (x, y) coordinates. The first point may or may not be repeated
/// as the last; the winding helpers accept both forms.
pub type Ring = Vec<[f64; 2]>;
