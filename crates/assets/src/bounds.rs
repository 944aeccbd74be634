//! Display-bounds resolution with a single-entry cache.

use std::collections::HashMap;
use std::sync::Arc;

use aq_common::{AqError, AqResult, DisplayCorners};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::layout;
use crate::source::AssetSource;

/// Per-pollutant display scale carried by the bounds descriptor.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PollutantScale {
    pub vmin: f64,
    pub vmax: f64,
    #[serde(default = "default_colormap")]
    pub colormap: String,
}

fn default_colormap() -> String {
    "inferno".to_string()
}

/// The consolidated per-(city, year) descriptor file.
#[derive(Debug, Clone, Deserialize)]
struct BoundsDescriptor {
    #[allow(dead_code)]
    city: Option<String>,
    #[allow(dead_code)]
    year: Option<String>,
    coordinates: Vec<[f64; 2]>,
    #[serde(default)]
    pollutants: HashMap<String, PollutantScale>,
}

/// Resolved corner coordinates plus the pollutant scale table from the same
/// descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedBounds {
    pub corners: DisplayCorners,
    pub scales: HashMap<String, PollutantScale>,
}

impl ResolvedBounds {
    /// Scale entry for a pollutant, looked up by its dotted spelling.
    pub fn scale_for(&self, pollutant: aq_common::Pollutant) -> Option<&PollutantScale> {
        self.scales.get(pollutant.dotted())
    }
}

/// Resolves display corners for a (city, year), caching the last answer.
///
/// The cache holds exactly one entry: month-to-month and pollutant-to-
/// pollutant switches reuse the same (city, year) bounds repeatedly, and
/// switching city or year invalidates by overwrite.
pub struct BoundsResolver {
    source: Arc<dyn AssetSource>,
    slot: RwLock<Option<(String, ResolvedBounds)>>,
}

impl BoundsResolver {
    pub fn new(source: Arc<dyn AssetSource>) -> Self {
        Self {
            source,
            slot: RwLock::new(None),
        }
    }

    fn unavailable(city: Option<&str>, year: u16, message: impl Into<String>) -> AqError {
        AqError::BoundsUnavailable {
            city: city.unwrap_or(layout::DEFAULT_CITY).to_string(),
            year,
            message: message.into(),
        }
    }

    /// Resolve corners for a (city, year). A cache hit returns without any
    /// fetch.
    pub async fn resolve(&self, city: Option<&str>, year: u16) -> AqResult<ResolvedBounds> {
        let cache_key = format!("{}:{}", city.unwrap_or(layout::DEFAULT_CITY), year);

        if let Some((key, bounds)) = self.slot.read().await.as_ref() {
            if *key == cache_key {
                debug!(key = %cache_key, "bounds cache hit");
                return Ok(bounds.clone());
            }
        }

        let path = layout::bounds_descriptor(city, year);
        let payload = self
            .source
            .fetch(&path)
            .await
            .map_err(|e| Self::unavailable(city, year, e.to_string()))?;

        let descriptor: BoundsDescriptor = serde_json::from_slice(&payload)
            .map_err(|e| Self::unavailable(city, year, format!("bad descriptor: {}", e)))?;

        let corners = DisplayCorners::from_coordinates(&descriptor.coordinates)
            .ok_or_else(|| {
                Self::unavailable(
                    city,
                    year,
                    format!(
                        "descriptor has {} coordinates, expected 4",
                        descriptor.coordinates.len()
                    ),
                )
            })?;

        let resolved = ResolvedBounds {
            corners,
            scales: descriptor.pollutants,
        };

        *self.slot.write().await = Some((cache_key, resolved.clone()));
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::tests_support::CountingSource;
    use aq_common::Pollutant;

    fn descriptor_json() -> &'static str {
        r#"{
            "city": "Bologna",
            "year": "2024",
            "coordinates": [[11.2, 44.6], [11.5, 44.6], [11.5, 44.4], [11.2, 44.4]],
            "pollutants": {
                "NO2": {"vmin": 0.0, "vmax": 50.0, "colormap": "inferno"},
                "PM2.5": {"vmin": 0.0, "vmax": 35.0}
            }
        }"#
    }

    #[tokio::test]
    async fn test_second_resolve_hits_cache() {
        let source = Arc::new(CountingSource::default());
        source.insert("predicted/Bologna/2024/bounds.json", descriptor_json());

        let resolver = BoundsResolver::new(source.clone());
        let first = resolver.resolve(Some("Bologna"), 2024).await.unwrap();
        let second = resolver.resolve(Some("Bologna"), 2024).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(source.count("predicted/Bologna/2024/bounds.json"), 1);
        assert_eq!(first.corners.top_left(), [11.2, 44.6]);
    }

    #[tokio::test]
    async fn test_city_switch_overwrites_slot() {
        let source = Arc::new(CountingSource::default());
        source.insert("predicted/Bologna/2024/bounds.json", descriptor_json());
        source.insert("predicted/Milano/2024/bounds.json", descriptor_json());

        let resolver = BoundsResolver::new(source.clone());
        resolver.resolve(Some("Bologna"), 2024).await.unwrap();
        resolver.resolve(Some("Milano"), 2024).await.unwrap();
        // Returning to the first city refetches: the slot held Milano.
        resolver.resolve(Some("Bologna"), 2024).await.unwrap();

        assert_eq!(source.count("predicted/Bologna/2024/bounds.json"), 2);
        assert_eq!(source.count("predicted/Milano/2024/bounds.json"), 1);
    }

    #[tokio::test]
    async fn test_missing_descriptor_is_bounds_unavailable() {
        let source = Arc::new(CountingSource::default());
        let resolver = BoundsResolver::new(source);
        let err = resolver.resolve(Some("Bologna"), 2024).await.unwrap_err();
        assert!(matches!(err, AqError::BoundsUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_wrong_corner_count_is_bounds_unavailable() {
        let source = Arc::new(CountingSource::default());
        source.insert(
            "predicted/Bologna/2024/bounds.json",
            r#"{"coordinates": [[0.0, 0.0], [1.0, 1.0]]}"#,
        );
        let resolver = BoundsResolver::new(source);
        let err = resolver.resolve(Some("Bologna"), 2024).await.unwrap_err();
        assert!(matches!(err, AqError::BoundsUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_scale_lookup_uses_dotted_spelling() {
        let source = Arc::new(CountingSource::default());
        source.insert("predicted/Bologna/2024/bounds.json", descriptor_json());
        let resolver = BoundsResolver::new(source);
        let bounds = resolver.resolve(Some("Bologna"), 2024).await.unwrap();

        let scale = bounds.scale_for(Pollutant::Pm25).unwrap();
        assert_eq!(scale.vmax, 35.0);
        assert_eq!(scale.colormap, "inferno");
        assert!(bounds.scale_for(Pollutant::So2).is_none());
    }
}
