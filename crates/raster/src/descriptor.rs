//! Raster descriptors and normalization ranges.

use aq_common::{AqError, AqResult};
use serde::{Deserialize, Serialize};

/// A fetched multi-band grid: one f32 plane per band, each of length
/// `width * height`, row-major. Lives only within one decode-and-display
/// operation.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterDescriptor {
    pub width: usize,
    pub height: usize,
    pub bands: Vec<Vec<f32>>,
}

impl RasterDescriptor {
    /// Create a descriptor, validating that every band covers the grid.
    pub fn new(width: usize, height: usize, bands: Vec<Vec<f32>>) -> AqResult<Self> {
        if width == 0 || height == 0 {
            return Err(AqError::InvalidRaster(format!(
                "empty grid: {}x{}",
                width, height
            )));
        }
        if bands.is_empty() {
            return Err(AqError::InvalidRaster("no bands".to_string()));
        }
        let expected = width * height;
        for (i, band) in bands.iter().enumerate() {
            if band.len() != expected {
                return Err(AqError::InvalidRaster(format!(
                    "band {} has {} values, expected {}",
                    i,
                    band.len(),
                    expected
                )));
            }
        }
        Ok(Self {
            width,
            height,
            bands,
        })
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }
}

/// The value range mapped onto [0, 255].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizationRange {
    pub min: f32,
    pub max: f32,
}

impl NormalizationRange {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Shared min/max across the given bands. Non-finite values are skipped;
    /// a grid with no finite values resolves to [0, 1].
    pub fn from_bands(bands: &[&[f32]]) -> Self {
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        for band in bands {
            for &v in *band {
                if v < min {
                    min = v;
                }
                if v > max {
                    max = v;
                }
            }
        }
        if !min.is_finite() || !max.is_finite() {
            return Self::new(0.0, 1.0);
        }
        Self { min, max }
    }

    /// Range width, floored to 1 when min and max coincide so the per-pixel
    /// division is always defined.
    pub fn width(&self) -> f32 {
        let width = self.max - self.min;
        if width == 0.0 {
            1.0
        } else {
            width
        }
    }
}
