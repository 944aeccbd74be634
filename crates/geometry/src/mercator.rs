//! Web Mercator (EPSG:3857) conversion for feature collections whose
//! coordinates were exported in projected meters.

use std::f64::consts::PI;

use tracing::debug;

use crate::feature::{Feature, FeatureCollection};

/// Half the Web Mercator circumference in meters (the projected coordinate
/// of longitude 180°).
pub const HALF_CIRCUMFERENCE: f64 = 20_037_508.34;

/// Convert a Web Mercator (x, y) in meters to (longitude, latitude) degrees.
pub fn web_mercator_to_lon_lat(x: f64, y: f64) -> [f64; 2] {
    let lon = x / HALF_CIRCUMFERENCE * 180.0;
    let lat_projected = y / HALF_CIRCUMFERENCE * 180.0;
    let lat = (lat_projected * PI / 180.0).exp().atan() * 360.0 / PI - 90.0;
    [lon, lat]
}

/// Convert (longitude, latitude) degrees to Web Mercator meters.
pub fn lon_lat_to_web_mercator(lon: f64, lat: f64) -> [f64; 2] {
    let x = lon / 180.0 * HALF_CIRCUMFERENCE;
    let lat_projected = ((lat + 90.0) * PI / 360.0).tan().ln() * 180.0 / PI;
    let y = lat_projected / 180.0 * HALF_CIRCUMFERENCE;
    [x, y]
}

/// True when the coordinate cannot be geographic degrees.
fn looks_projected(coord: [f64; 2]) -> bool {
    coord[0].abs() > 180.0 || coord[1].abs() > 90.0
}

/// Inspect the collection's first coordinate; if it lies outside geographic
/// range, treat the whole collection as Web Mercator and reproject every
/// coordinate. Otherwise the collection is returned unchanged.
pub fn detect_and_reproject(collection: FeatureCollection) -> FeatureCollection {
    let Some(first) = collection
        .features
        .first()
        .and_then(|feature| feature.geometry.first_coordinate())
    else {
        return collection;
    };

    if !looks_projected(first) {
        return collection;
    }

    debug!(
        x = first[0],
        y = first[1],
        "reprojecting feature collection from Web Mercator"
    );

    let features = collection
        .features
        .iter()
        .map(|feature| {
            Feature::new(
                feature
                    .geometry
                    .map_coordinates(&|[x, y]| web_mercator_to_lon_lat(x, y)),
                feature.properties.clone(),
            )
        })
        .collect();
    FeatureCollection::new(features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::Geometry;

    #[test]
    fn test_origin_maps_to_origin() {
        assert_eq!(web_mercator_to_lon_lat(0.0, 0.0), [0.0, 0.0]);
    }

    #[test]
    fn test_round_trip_within_tolerance() {
        let cases = [
            [11.34, 44.49],
            [-122.42, 37.77],
            [151.21, -33.87],
            [0.0, 66.5],
            [-179.9, -84.0],
        ];
        for [lon, lat] in cases {
            let [x, y] = lon_lat_to_web_mercator(lon, lat);
            let [lon2, lat2] = web_mercator_to_lon_lat(x, y);
            assert!(
                (lon - lon2).abs() < 1e-6 && (lat - lat2).abs() < 1e-6,
                "round trip drifted: ({lon}, {lat}) -> ({lon2}, {lat2})"
            );
        }
    }

    #[test]
    fn test_antimeridian_x() {
        let [lon, _] = web_mercator_to_lon_lat(HALF_CIRCUMFERENCE, 0.0);
        assert!((lon - 180.0).abs() < 1e-9);
    }

    fn point_collection(x: f64, y: f64) -> FeatureCollection {
        FeatureCollection::new(vec![Feature::new(
            Geometry::Point {
                coordinates: [x, y],
            },
            serde_json::Map::new(),
        )])
    }

    #[test]
    fn test_geographic_collection_unchanged() {
        let fc = point_collection(11.3, 44.5);
        let out = detect_and_reproject(fc.clone());
        assert_eq!(out, fc);
    }

    #[test]
    fn test_projected_collection_reprojected() {
        let [x, y] = lon_lat_to_web_mercator(11.3, 44.5);
        let out = detect_and_reproject(point_collection(x, y));
        let Geometry::Point { coordinates } = &out.features[0].geometry else {
            panic!("expected point");
        };
        assert!((coordinates[0] - 11.3).abs() < 1e-6);
        assert!((coordinates[1] - 44.5).abs() < 1e-6);
    }

    #[test]
    fn test_empty_collection_unchanged() {
        let fc = FeatureCollection::empty();
        assert_eq!(detect_and_reproject(fc.clone()), fc);
    }
}
