//! Point-in-polygon containment tests.

use crate::{Feature, FeatureCollection, Geometry};

/// Even-odd ray-cast containment test against a single ring.
///
/// Only the outer ring is tested; holes are not subtracted. The comparisons
/// are strict, so a point exactly on an edge resolves to a fixed answer that
/// is consistent across repeated calls (on-edge points along the ring's top
/// boundary test outside, along the bottom boundary inside).
pub fn point_in_polygon(point: [f64; 2], ring: &[[f64; 2]]) -> bool {
    let [x, y] = point;
    let n = ring.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let [xi, yi] = ring[i];
        let [xj, yj] = ring[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn feature_contains(feature: &Feature, lng: f64, lat: f64) -> bool {
    match &feature.geometry {
        Geometry::Point { .. } => false,
        Geometry::Polygon { coordinates } => coordinates
            .first()
            .is_some_and(|outer| point_in_polygon([lng, lat], outer)),
        Geometry::MultiPolygon { coordinates } => coordinates.iter().any(|part| {
            part.first()
                .is_some_and(|outer| point_in_polygon([lng, lat], outer))
        }),
    }
}

/// True if the point lies inside any feature's outer ring.
pub fn is_point_in_region(lng: f64, lat: f64, regions: &FeatureCollection) -> bool {
    regions
        .features
        .iter()
        .any(|feature| feature_contains(feature, lng, lat))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Vec<[f64; 2]> {
        vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]
    }

    #[test]
    fn test_unit_square_containment() {
        let ring = unit_square();
        assert!(point_in_polygon([0.5, 0.5], &ring));
        assert!(!point_in_polygon([2.0, 2.0], &ring));
        assert!(!point_in_polygon([-0.5, 0.5], &ring));
    }

    #[test]
    fn test_edge_point_is_consistent() {
        let ring = unit_square();
        let first = point_in_polygon([1.0, 0.5], &ring);
        for _ in 0..10 {
            assert_eq!(point_in_polygon([1.0, 0.5], &ring), first);
        }
    }

    #[test]
    fn test_degenerate_ring_is_outside() {
        assert!(!point_in_polygon([0.0, 0.0], &[[0.0, 0.0], [1.0, 1.0]]));
    }

    #[test]
    fn test_region_containment_multipolygon() {
        let fc = FeatureCollection::new(vec![Feature::new(
            Geometry::MultiPolygon {
                coordinates: vec![
                    vec![unit_square()],
                    vec![vec![
                        [10.0, 10.0],
                        [11.0, 10.0],
                        [11.0, 11.0],
                        [10.0, 11.0],
                        [10.0, 10.0],
                    ]],
                ],
            },
            serde_json::Map::new(),
        )]);

        assert!(is_point_in_region(0.5, 0.5, &fc));
        assert!(is_point_in_region(10.5, 10.5, &fc));
        assert!(!is_point_in_region(5.0, 5.0, &fc));
    }
}
