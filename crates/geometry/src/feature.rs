//! GeoJSON-compatible feature model.
//!
//! Only the geometry types the asset pipeline produces are represented.
//! Adding a geometry type is a compile-time-checked change: every consumer
//! matches exhaustively.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A GeoJSON geometry. Tagged (de)serialization matches the standard
/// `{"type": ..., "coordinates": ...}` encoding; unknown types fail to
/// deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: [f64; 2] },
    Polygon { coordinates: Vec<Vec<[f64; 2]>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<[f64; 2]>>> },
}

impl Geometry {
    /// The first coordinate of the geometry, used for projection detection.
    pub fn first_coordinate(&self) -> Option<[f64; 2]> {
        match self {
            Geometry::Point { coordinates } => Some(*coordinates),
            Geometry::Polygon { coordinates } => {
                coordinates.first().and_then(|ring| ring.first()).copied()
            }
            Geometry::MultiPolygon { coordinates } => coordinates
                .first()
                .and_then(|part| part.first())
                .and_then(|ring| ring.first())
                .copied(),
        }
    }

    /// Apply a coordinate transform to every position in the geometry.
    pub fn map_coordinates(&self, f: &impl Fn([f64; 2]) -> [f64; 2]) -> Geometry {
        match self {
            Geometry::Point { coordinates } => Geometry::Point {
                coordinates: f(*coordinates),
            },
            Geometry::Polygon { coordinates } => Geometry::Polygon {
                coordinates: coordinates
                    .iter()
                    .map(|ring| ring.iter().map(|&p| f(p)).collect())
                    .collect(),
            },
            Geometry::MultiPolygon { coordinates } => Geometry::MultiPolygon {
                coordinates: coordinates
                    .iter()
                    .map(|part| {
                        part.iter()
                            .map(|ring| ring.iter().map(|&p| f(p)).collect())
                            .collect()
                    })
                    .collect(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum FeatureTag {
    Feature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum CollectionTag {
    FeatureCollection,
}

/// A GeoJSON feature with free-form properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    tag: FeatureTag,
    pub geometry: Geometry,
    #[serde(default)]
    pub properties: serde_json::Map<String, Value>,
}

impl Feature {
    pub fn new(geometry: Geometry, properties: serde_json::Map<String, Value>) -> Self {
        Self {
            tag: FeatureTag::Feature,
            geometry,
            properties,
        }
    }

    /// Read a string property.
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }

    /// Read a numeric property.
    pub fn property_f64(&self, key: &str) -> Option<f64> {
        self.properties.get(key).and_then(Value::as_f64)
    }
}

/// A GeoJSON feature collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    tag: CollectionTag,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            tag: CollectionTag::FeatureCollection,
            features,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_standard_geojson() {
        let json = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [11.3, 44.5]},
                "properties": {"station_id": "IT0892A", "ground_truth_value": 21.4}
            }]
        }"#;
        let fc: FeatureCollection = serde_json::from_str(json).unwrap();
        assert_eq!(fc.len(), 1);
        assert_eq!(fc.features[0].property_str("station_id"), Some("IT0892A"));
        assert_eq!(
            fc.features[0].property_f64("ground_truth_value"),
            Some(21.4)
        );
    }

    #[test]
    fn test_unknown_geometry_type_rejected() {
        let json = r#"{"type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]]}"#;
        assert!(serde_json::from_str::<Geometry>(json).is_err());
    }

    #[test]
    fn test_first_coordinate() {
        let poly = Geometry::Polygon {
            coordinates: vec![vec![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0], [1.0, 2.0]]],
        };
        assert_eq!(poly.first_coordinate(), Some([1.0, 2.0]));

        let empty = Geometry::Polygon {
            coordinates: vec![],
        };
        assert_eq!(empty.first_coordinate(), None);
    }
}
