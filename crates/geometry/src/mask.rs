//! Inverse-mask polygon construction.

use crate::feature::{FeatureCollection, Geometry};
use crate::winding::ensure_winding;
use crate::Ring;

/// The full-globe rectangle used as the mask's outer ring.
fn world_ring() -> Ring {
    vec![
        [-180.0, -90.0],
        [-180.0, 90.0],
        [180.0, 90.0],
        [180.0, -90.0],
        [-180.0, -90.0],
    ]
}

/// Build a polygon covering the whole globe with the given regions cut out
/// as holes, used to dim everything outside a region of interest.
///
/// Only the outer ring of each input Polygon (and of each MultiPolygon part)
/// becomes a hole; inner rings of the inputs are ignored. Holes are
/// normalized clockwise per the polygon-with-holes convention.
pub fn build_inverse_mask(regions: &FeatureCollection) -> Geometry {
    let mut rings: Vec<Ring> = vec![world_ring()];

    for feature in &regions.features {
        match &feature.geometry {
            Geometry::Point { .. } => {}
            Geometry::Polygon { coordinates } => {
                if let Some(outer) = coordinates.first() {
                    rings.push(ensure_winding(outer.clone(), true));
                }
            }
            Geometry::MultiPolygon { coordinates } => {
                for part in coordinates {
                    if let Some(outer) = part.first() {
                        rings.push(ensure_winding(outer.clone(), true));
                    }
                }
            }
        }
    }

    Geometry::Polygon { coordinates: rings }
}
