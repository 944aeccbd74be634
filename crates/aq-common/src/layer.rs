//! Layer identity for materialized rasters.

use serde::{Deserialize, Serialize};

use crate::{PeriodKey, Pollutant};

/// Identifies one materializable raster layer.
///
/// Two keys are equal iff city, pollutant, year and month all match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerKey {
    /// City the raster belongs to; None selects the default asset tree.
    pub city: Option<String>,
    pub pollutant: Pollutant,
    pub period: PeriodKey,
}

impl LayerKey {
    pub fn new(city: Option<String>, pollutant: Pollutant, period: PeriodKey) -> Self {
        Self {
            city,
            pollutant,
            period,
        }
    }

    /// True when `other` differs at most in the month. A month-only change
    /// reuses the materialized raster slot without any fetches.
    pub fn same_raster_slot(&self, other: &LayerKey) -> bool {
        self.city == other.city
            && self.pollutant == other.pollutant
            && self.period.year == other.period.year
    }

    /// Stable key for the decoded-image cache.
    pub fn cache_key(&self) -> String {
        format!(
            "{}:{}:{}",
            self.city.as_deref().unwrap_or("default"),
            self.pollutant.file_token(),
            self.period
        )
    }
}

impl std::fmt::Display for LayerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.city.as_deref().unwrap_or("default"),
            self.pollutant,
            self.period
        )
    }
}

/// What the pollutant selector asked for. The opacity-control and no-data
/// entries in the selector are not pollutants, so requests carry a tagged
/// selection rather than a sentinel string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerSelection {
    Pollutant(Pollutant),
    /// The slider drives layer opacity instead of month selection.
    OpacityControl,
    /// No raster is available for the selection; tear down the current one.
    NoData,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(city: &str, pollutant: Pollutant, year: u16, month: u8) -> LayerKey {
        LayerKey::new(
            Some(city.to_string()),
            pollutant,
            PeriodKey::new(year, month).unwrap(),
        )
    }

    #[test]
    fn test_same_raster_slot() {
        let feb = key("Bologna", Pollutant::No2, 2024, 2);
        let mar = key("Bologna", Pollutant::No2, 2024, 3);
        assert!(feb.same_raster_slot(&mar));
        assert_ne!(feb, mar);

        let other_year = key("Bologna", Pollutant::No2, 2025, 2);
        assert!(!feb.same_raster_slot(&other_year));

        let other_city = key("Milano", Pollutant::No2, 2024, 2);
        assert!(!feb.same_raster_slot(&other_city));

        let other_pollutant = key("Bologna", Pollutant::O3, 2024, 2);
        assert!(!feb.same_raster_slot(&other_pollutant));
    }

    #[test]
    fn test_cache_key_uses_default_city() {
        let key = LayerKey::new(
            None,
            Pollutant::Pm25,
            PeriodKey::new(2024, 7).unwrap(),
        );
        assert_eq!(key.cache_key(), "default:PM2_5:2024-07");
    }
}
