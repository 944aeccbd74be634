//! Asset tree layout.
//!
//! Path contracts for the files the offline pipeline publishes. All paths
//! are relative to the asset root and slash-separated.

use aq_common::{PeriodKey, Pollutant};

/// Directory name used when no city is selected.
pub const DEFAULT_CITY: &str = "default";

fn city_dir(city: Option<&str>) -> &str {
    city.unwrap_or(DEFAULT_CITY)
}

/// Consolidated bounds descriptor for one (city, year).
pub fn bounds_descriptor(city: Option<&str>, year: u16) -> String {
    format!("predicted/{}/{}/bounds.json", city_dir(city), year)
}

/// Per-month raster image. The pollutant spelling replaces the dot with an
/// underscore; the colormap comes from the bounds descriptor.
pub fn raster_image(
    city: Option<&str>,
    pollutant: Pollutant,
    period: PeriodKey,
    colormap: &str,
    extension: &str,
) -> String {
    format!(
        "predicted/{}/{}/{}_month{}_{}.{}",
        city_dir(city),
        period.year,
        pollutant.file_token(),
        period.month_token(),
        colormap,
        extension
    )
}

/// Consolidated ground-truth stations for one pollutant, all periods.
pub fn consolidated_stations(pollutant: Pollutant) -> String {
    format!("ground_truth_stations/stations_{}.geojson", pollutant.dotted())
}

/// Per-city station predictions for one exact (pollutant, period).
pub fn city_stations(city: &str, pollutant: Pollutant, period: PeriodKey) -> String {
    format!(
        "predictions_stations/{}/stations_{}_{}_{}.geojson",
        city,
        pollutant.dotted(),
        period.year,
        period.month_token()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period() -> PeriodKey {
        PeriodKey::new(2024, 3).unwrap()
    }

    #[test]
    fn test_bounds_path() {
        assert_eq!(
            bounds_descriptor(Some("Bologna"), 2024),
            "predicted/Bologna/2024/bounds.json"
        );
        assert_eq!(bounds_descriptor(None, 2025), "predicted/default/2025/bounds.json");
    }

    #[test]
    fn test_raster_path_uses_file_token() {
        assert_eq!(
            raster_image(Some("Milano"), Pollutant::Pm25, period(), "inferno", "tif"),
            "predicted/Milano/2024/PM2_5_month03_inferno.tif"
        );
    }

    #[test]
    fn test_station_paths_use_dotted_spelling() {
        assert_eq!(
            consolidated_stations(Pollutant::Pm25),
            "ground_truth_stations/stations_PM2.5.geojson"
        );
        assert_eq!(
            city_stations("Frascati", Pollutant::No2, period()),
            "predictions_stations/Frascati/stations_NO2_2024_03.geojson"
        );
    }
}
