//! Station overlay loading and caching.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use aq_common::{AqError, AqResult, PeriodKey, Pollutant};
use futures::future::join_all;
use geometry::{detect_and_reproject, FeatureCollection};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::layout;
use crate::source::AssetSource;

fn parse_collection(payload: &[u8]) -> AqResult<FeatureCollection> {
    let collection: FeatureCollection = serde_json::from_slice(payload)?;
    Ok(detect_and_reproject(collection))
}

/// Loads and caches station feature collections.
///
/// Consolidated per-pollutant files are cached for the process lifetime;
/// the source data is static per session, so entries are never invalidated.
pub struct StationStore {
    source: Arc<dyn AssetSource>,
    consolidated: RwLock<HashMap<Pollutant, Arc<FeatureCollection>>>,
}

impl StationStore {
    pub fn new(source: Arc<dyn AssetSource>) -> Self {
        Self {
            source,
            consolidated: RwLock::new(HashMap::new()),
        }
    }

    /// Consolidated collection for one pollutant, fetched once per session.
    async fn consolidated_for(&self, pollutant: Pollutant) -> AqResult<Arc<FeatureCollection>> {
        if let Some(collection) = self.consolidated.read().await.get(&pollutant) {
            debug!(%pollutant, "station cache hit");
            return Ok(collection.clone());
        }

        let payload = self
            .source
            .fetch(&layout::consolidated_stations(pollutant))
            .await?;
        let collection = Arc::new(parse_collection(&payload)?);

        self.consolidated
            .write()
            .await
            .insert(pollutant, collection.clone());
        Ok(collection)
    }

    /// Stations for one (pollutant, period).
    ///
    /// Prefers the per-city prediction file scoped to the exact period; when
    /// that is unavailable, falls back to the consolidated per-pollutant
    /// file filtered by `period_key`. The result may be empty; callers must
    /// then remove any existing overlay rather than leave a stale one.
    pub async fn load(
        &self,
        city: Option<&str>,
        pollutant: Pollutant,
        period: PeriodKey,
    ) -> AqResult<FeatureCollection> {
        if let Some(city) = city {
            match self
                .source
                .fetch(&layout::city_stations(city, pollutant, period))
                .await
            {
                Ok(payload) => return parse_collection(&payload),
                Err(AqError::FetchUnavailable(path)) => {
                    debug!(%path, "no per-city station file, falling back to consolidated");
                }
                Err(e) => return Err(e),
            }
        }

        let consolidated = self.consolidated_for(pollutant).await?;
        let period_key = period.to_string();
        let features = consolidated
            .features
            .iter()
            .filter(|feature| feature.property_str("period_key") == Some(period_key.as_str()))
            .cloned()
            .collect();
        Ok(FeatureCollection::new(features))
    }

    /// Union of stations across every pollutant's consolidated file,
    /// deduplicated by the first occurrence of each `station_id` and
    /// bypassing the period filter.
    ///
    /// The per-pollutant fetches run concurrently; each completion writes
    /// its own cache slot, and the merge reads the results after every
    /// fetch has settled. Pollutants whose file is missing are skipped.
    pub async fn all_stations(&self) -> AqResult<FeatureCollection> {
        let fetches = Pollutant::ALL
            .iter()
            .map(|&pollutant| async move { (pollutant, self.consolidated_for(pollutant).await) });
        let settled = join_all(fetches).await;

        let mut seen = HashSet::new();
        let mut features = Vec::new();
        for (pollutant, result) in settled {
            let collection = match result {
                Ok(collection) => collection,
                Err(AqError::FetchUnavailable(path)) => {
                    warn!(%pollutant, %path, "skipping pollutant without consolidated stations");
                    continue;
                }
                Err(e) => return Err(e),
            };
            for feature in &collection.features {
                let Some(station_id) = feature.property_str("station_id") else {
                    continue;
                };
                if seen.insert(station_id.to_string()) {
                    features.push(feature.clone());
                }
            }
        }
        Ok(FeatureCollection::new(features))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::tests_support::CountingSource;

    fn station(id: &str, period_key: &str, value: f64) -> String {
        format!(
            r#"{{
                "type": "Feature",
                "geometry": {{"type": "Point", "coordinates": [11.3, 44.5]}},
                "properties": {{
                    "station_id": "{id}",
                    "period_key": "{period_key}",
                    "ground_truth_value": {value}
                }}
            }}"#
        )
    }

    fn collection(features: &[String]) -> String {
        format!(
            r#"{{"type": "FeatureCollection", "features": [{}]}}"#,
            features.join(",")
        )
    }

    #[tokio::test]
    async fn test_prefers_city_file() {
        let source = Arc::new(CountingSource::default());
        source.insert(
            "predictions_stations/Bologna/stations_NO2_2024_03.geojson",
            collection(&[station("a", "2024-03", 20.0)]).into_bytes(),
        );

        let store = StationStore::new(source.clone());
        let period = PeriodKey::new(2024, 3).unwrap();
        let result = store
            .load(Some("Bologna"), Pollutant::No2, period)
            .await
            .unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(source.count("ground_truth_stations/stations_NO2.geojson"), 0);
    }

    #[tokio::test]
    async fn test_fallback_filters_by_period() {
        let source = Arc::new(CountingSource::default());
        source.insert(
            "ground_truth_stations/stations_NO2.geojson",
            collection(&[
                station("a", "2024-02", 18.0),
                station("b", "2024-03", 22.0),
                station("c", "2024-04", 25.0),
            ])
            .into_bytes(),
        );

        let store = StationStore::new(source);
        let period = PeriodKey::new(2024, 3).unwrap();
        let result = store
            .load(Some("Bologna"), Pollutant::No2, period)
            .await
            .unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result.features[0].property_str("station_id"), Some("b"));
    }

    #[tokio::test]
    async fn test_consolidated_cached_across_loads() {
        let source = Arc::new(CountingSource::default());
        source.insert(
            "ground_truth_stations/stations_NO2.geojson",
            collection(&[station("a", "2024-02", 18.0)]).into_bytes(),
        );

        let store = StationStore::new(source.clone());
        for month in [1u8, 2, 3] {
            let period = PeriodKey::new(2024, month).unwrap();
            store.load(None, Pollutant::No2, period).await.unwrap();
        }
        assert_eq!(source.count("ground_truth_stations/stations_NO2.geojson"), 1);
    }

    #[tokio::test]
    async fn test_empty_result_when_no_period_matches() {
        let source = Arc::new(CountingSource::default());
        source.insert(
            "ground_truth_stations/stations_NO2.geojson",
            collection(&[station("a", "2023-01", 15.0)]).into_bytes(),
        );

        let store = StationStore::new(source);
        let period = PeriodKey::new(2024, 3).unwrap();
        let result = store.load(None, Pollutant::No2, period).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_all_stations_dedupes_by_first_occurrence() {
        let source = Arc::new(CountingSource::default());
        source.insert(
            "ground_truth_stations/stations_NO2.geojson",
            collection(&[
                station("a", "2024-01", 20.0),
                station("b", "2024-01", 30.0),
            ])
            .into_bytes(),
        );
        source.insert(
            "ground_truth_stations/stations_O3.geojson",
            collection(&[
                station("a", "2024-01", 55.0),
                station("d", "2024-01", 60.0),
            ])
            .into_bytes(),
        );
        // SO2, PM2.5 and PM10 files are absent and skipped.

        let store = StationStore::new(source);
        let result = store.all_stations().await.unwrap();

        assert_eq!(result.len(), 3);
        // First occurrence wins: station "a" keeps the NO2 value.
        let a = result
            .features
            .iter()
            .find(|f| f.property_str("station_id") == Some("a"))
            .unwrap();
        assert_eq!(a.property_f64("ground_truth_value"), Some(20.0));
    }

    #[tokio::test]
    async fn test_malformed_payload_is_decode_failure() {
        let source = Arc::new(CountingSource::default());
        source.insert(
            "ground_truth_stations/stations_NO2.geojson",
            b"not json".to_vec(),
        );

        let store = StationStore::new(source);
        let period = PeriodKey::new(2024, 3).unwrap();
        let err = store.load(None, Pollutant::No2, period).await.unwrap_err();
        assert!(matches!(err, AqError::DecodeFailure(_)));
    }
}
