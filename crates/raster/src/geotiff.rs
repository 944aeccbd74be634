//! GeoTIFF band extraction.
//!
//! The prediction pipeline ships per-month multi-band GeoTIFFs; this module
//! turns the fetched bytes into a [`RasterDescriptor`] of f32 planes. Sample
//! geometry (tiling, compression) is handled by the `tiff` decoder; only the
//! sample formats the pipeline emits are accepted.

use std::io::Cursor;

use aq_common::{AqError, AqResult};
use tiff::decoder::{Decoder, DecodingResult};
use tiff::ColorType;

use crate::descriptor::RasterDescriptor;

fn tiff_err(context: &str, err: impl std::fmt::Display) -> AqError {
    AqError::DecodeFailure(format!("{}: {}", context, err))
}

/// Split interleaved samples into per-band planes.
fn planes<T: Copy>(data: &[T], samples: usize, pixels: usize, to_f32: impl Fn(T) -> f32) -> Vec<Vec<f32>> {
    let mut bands = vec![Vec::with_capacity(pixels); samples];
    for (i, &value) in data.iter().enumerate() {
        bands[i % samples].push(to_f32(value));
    }
    bands
}

/// Parse a GeoTIFF payload into band planes.
pub fn read_geotiff(bytes: &[u8]) -> AqResult<RasterDescriptor> {
    let mut decoder =
        Decoder::new(Cursor::new(bytes)).map_err(|e| tiff_err("not a TIFF payload", e))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| tiff_err("missing dimensions", e))?;
    let width = width as usize;
    let height = height as usize;

    let samples = match decoder
        .colortype()
        .map_err(|e| tiff_err("missing color type", e))?
    {
        ColorType::Gray(_) => 1,
        ColorType::GrayA(_) => 2,
        ColorType::RGB(_) => 3,
        ColorType::RGBA(_) => 4,
        ColorType::Multiband { num_samples, .. } => num_samples as usize,
        other => {
            return Err(AqError::DecodeFailure(format!(
                "unsupported TIFF color type: {:?}",
                other
            )))
        }
    };

    let image = decoder
        .read_image()
        .map_err(|e| tiff_err("failed to read image data", e))?;

    let pixels = width * height;
    let bands = match &image {
        DecodingResult::U8(data) => planes(data, samples, pixels, |v| v as f32),
        DecodingResult::U16(data) => planes(data, samples, pixels, |v| v as f32),
        DecodingResult::U32(data) => planes(data, samples, pixels, |v| v as f32),
        DecodingResult::I16(data) => planes(data, samples, pixels, |v| v as f32),
        DecodingResult::I32(data) => planes(data, samples, pixels, |v| v as f32),
        DecodingResult::F32(data) => planes(data, samples, pixels, |v| v),
        DecodingResult::F64(data) => planes(data, samples, pixels, |v| v as f32),
        _ => {
            return Err(AqError::DecodeFailure(
                "unsupported TIFF sample format".to_string(),
            ))
        }
    };

    if bands.iter().any(|band| band.len() != pixels) {
        return Err(AqError::DecodeFailure(format!(
            "sample count does not match {}x{}x{}",
            width, height, samples
        )));
    }

    RasterDescriptor::new(width, height, bands)
}
