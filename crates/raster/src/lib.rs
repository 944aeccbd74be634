//! Multi-band raster decoding into displayable RGBA buffers.

pub mod decode;
pub mod descriptor;
pub mod geotiff;

pub use decode::{decode, DecodeOptions, DecodedImage};
pub use descriptor::{NormalizationRange, RasterDescriptor};
pub use geotiff::read_geotiff;
