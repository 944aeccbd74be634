//! Error types for the air-quality map engine.

use thiserror::Error;

/// Result type alias using AqError.
pub type AqResult<T> = Result<T, AqError>;

/// Primary error type for view-engine operations.
#[derive(Debug, Error)]
pub enum AqError {
    // === Retrieval Errors ===
    #[error("Asset not available: {0}")]
    FetchUnavailable(String),

    // === Decoding Errors ===
    #[error("Failed to decode payload: {0}")]
    DecodeFailure(String),

    // === Bounds Errors ===
    #[error("Display bounds unavailable for {city}/{year}: {message}")]
    BoundsUnavailable {
        city: String,
        year: u16,
        message: String,
    },

    // === Parameter Errors ===
    #[error("Invalid period: {0}")]
    InvalidPeriod(String),

    #[error("Unknown pollutant: {0}")]
    UnknownPollutant(String),

    #[error("Invalid raster descriptor: {0}")]
    InvalidRaster(String),

    // === Infrastructure Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AqError {
    /// Whether this failure blocks the in-flight state transition.
    ///
    /// Non-blocking failures ("feature absent") are logged and the session
    /// degrades to showing nothing new; blocking failures abort the cold
    /// path while the previous visual state stays on the surface.
    pub fn blocks_transition(&self) -> bool {
        !matches!(self, AqError::FetchUnavailable(_))
    }
}

// Conversion from common error types
impl From<std::io::Error> for AqError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => AqError::FetchUnavailable(err.to_string()),
            _ => AqError::Internal(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for AqError {
    fn from(err: serde_json::Error) -> Self {
        AqError::DecodeFailure(format!("JSON error: {}", err))
    }
}
