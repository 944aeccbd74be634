//! Pollutant identifiers and display-time unit conversion.

use serde::{Deserialize, Serialize};

use crate::{AqError, AqResult};

/// A pollutant with prediction rasters and ground-truth stations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pollutant {
    No2,
    O3,
    So2,
    Pm25,
    Pm10,
}

impl Pollutant {
    /// All pollutants, in the order station files are merged for the
    /// "show all stations" view.
    pub const ALL: [Pollutant; 5] = [
        Pollutant::No2,
        Pollutant::O3,
        Pollutant::So2,
        Pollutant::Pm25,
        Pollutant::Pm10,
    ];

    /// Spelling used in raster file names (dot replaced by underscore).
    pub fn file_token(&self) -> &'static str {
        match self {
            Pollutant::No2 => "NO2",
            Pollutant::O3 => "O3",
            Pollutant::So2 => "SO2",
            Pollutant::Pm25 => "PM2_5",
            Pollutant::Pm10 => "PM10",
        }
    }

    /// Spelling used in station file names and bounds descriptors.
    pub fn dotted(&self) -> &'static str {
        match self {
            Pollutant::No2 => "NO2",
            Pollutant::O3 => "O3",
            Pollutant::So2 => "SO2",
            Pollutant::Pm25 => "PM2.5",
            Pollutant::Pm10 => "PM10",
        }
    }

    /// Parse either spelling ("PM2.5" and "PM2_5" both accepted).
    pub fn parse(s: &str) -> AqResult<Self> {
        match s {
            "NO2" => Ok(Pollutant::No2),
            "O3" => Ok(Pollutant::O3),
            "SO2" => Ok(Pollutant::So2),
            "PM2.5" | "PM2_5" => Ok(Pollutant::Pm25),
            "PM10" => Ok(Pollutant::Pm10),
            other => Err(AqError::UnknownPollutant(other.to_string())),
        }
    }

    /// Conversion factor from ppb to µg/m³, applied only at display time
    /// for ground-truth popups. Particulates are measured in µg/m³ already
    /// and pass through unconverted.
    pub fn ug_per_m3_factor(&self) -> f64 {
        match self {
            Pollutant::No2 => 1.88,
            Pollutant::O3 => 1.96,
            Pollutant::So2 => 2.62,
            Pollutant::Pm25 | Pollutant::Pm10 => 1.0,
        }
    }

    /// Convert a measured value to µg/m³ for display.
    pub fn to_ug_per_m3(&self, value: f64) -> f64 {
        value * self.ug_per_m3_factor()
    }
}

impl std::fmt::Display for Pollutant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dotted())
    }
}
