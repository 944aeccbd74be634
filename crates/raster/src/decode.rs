//! Decoding a multi-band grid into a normalized RGBA buffer.

use aq_common::{AqError, AqResult};
use tracing::warn;

use crate::descriptor::{NormalizationRange, RasterDescriptor};

/// Decode options: explicit band selection and/or an explicit value range.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DecodeOptions {
    /// Bands mapped to R, G, B. Defaults to the first three bands, or a
    /// single band replicated.
    pub band_indices: Option<[usize; 3]>,
    /// Value range mapped to [0, 255]. Computed from the selected bands when
    /// absent.
    pub range: Option<NormalizationRange>,
}

/// A decoded, displayable image: flat RGBA bytes, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub pixels: Vec<u8>,
    pub width: usize,
    pub height: usize,
}

/// Select the three display bands: explicit indices, else the first three,
/// else a single band replicated. Anomalous counts are logged; a two-band
/// grid falls back to band 0, a wider grid uses its first three bands.
fn select_bands<'a>(
    grid: &'a RasterDescriptor,
    options: &DecodeOptions,
) -> AqResult<[&'a [f32]; 3]> {
    if let Some(indices) = options.band_indices {
        let mut selected = [&[] as &[f32]; 3];
        for (slot, &index) in selected.iter_mut().zip(indices.iter()) {
            *slot = grid
                .bands
                .get(index)
                .ok_or_else(|| {
                    AqError::DecodeFailure(format!(
                        "band index {} out of range ({} bands)",
                        index,
                        grid.band_count()
                    ))
                })?
                .as_slice();
        }
        return Ok(selected);
    }

    match grid.band_count() {
        3 => Ok([&grid.bands[0], &grid.bands[1], &grid.bands[2]]),
        1 => Ok([&grid.bands[0]; 3]),
        2 => {
            warn!(bands = 2, "anomalous band count, replicating band 0");
            Ok([&grid.bands[0]; 3])
        }
        n => {
            warn!(bands = n, "anomalous band count, using first three bands");
            Ok([&grid.bands[0], &grid.bands[1], &grid.bands[2]])
        }
    }
}

/// Decode the grid into a fully opaque RGBA buffer.
///
/// A single normalization range is shared by all three channels, preserving
/// relative brightness across them. Each channel value is
/// `clamp(round((value - min) / range * 255), 0, 255)`; alpha is 255 for
/// every pixel.
pub fn decode(grid: &RasterDescriptor, options: &DecodeOptions) -> AqResult<DecodedImage> {
    let bands = select_bands(grid, options)?;
    let range = options
        .range
        .unwrap_or_else(|| NormalizationRange::from_bands(&bands));
    let min = range.min;
    let width = range.width();

    let pixel_count = grid.width * grid.height;
    let mut pixels = vec![0u8; pixel_count * 4];

    let map = |value: f32| -> u8 { ((value - min) / width * 255.0).round().clamp(0.0, 255.0) as u8 };

    for i in 0..pixel_count {
        let offset = i * 4;
        pixels[offset] = map(bands[0][i]);
        pixels[offset + 1] = map(bands[1][i]);
        pixels[offset + 2] = map(bands[2][i]);
        pixels[offset + 3] = 255;
    }

    Ok(DecodedImage {
        pixels,
        width: grid.width,
        height: grid.height,
    })
}
