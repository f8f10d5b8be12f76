//! Deterministic PNG writer.
//!
//! Uses fixed compression and filter settings so the same pixels always
//! encode to byte-identical files, which keeps report hashes stable.

use std::io::Write;

use png::{BitDepth, ColorType, Compression, Encoder, FilterType};
use thiserror::Error;

use crate::raster::{Rgba16Image, TileRaster};

/// Errors from PNG operations.
#[derive(Debug, Error)]
pub enum PngError {
    #[error("PNG encoding error: {0}")]
    Encoding(#[from] png::EncodingError),

    #[error("Unsupported raster for PNG: {0}")]
    Unsupported(String),
}

/// PNG export configuration for deterministic output.
#[derive(Debug, Clone)]
pub struct PngConfig {
    pub compression: Compression,
    pub filter: FilterType,
}

impl Default for PngConfig {
    fn default() -> Self {
        Self {
            compression: Compression::Default,
            filter: FilterType::NoFilter,
        }
    }
}

/// Writes an 8-bit or 16-bit raster to any writer.
///
/// Float rasters are rejected; they go to OpenEXR instead.
pub fn write_raster_to_writer<W: Write>(
    raster: &TileRaster,
    writer: W,
    config: &PngConfig,
) -> Result<(), PngError> {
    match raster {
        TileRaster::Rgba8(img) => write_raw(
            img.as_raw(),
            img.width(),
            img.height(),
            BitDepth::Eight,
            writer,
            config,
        ),
        TileRaster::Rgba16(img) => {
            let bytes = rgba16_to_be_bytes(img);
            write_raw(&bytes, img.width(), img.height(), BitDepth::Sixteen, writer, config)
        }
        TileRaster::Rgba32F(_) => Err(PngError::Unsupported(
            "32-bit float rasters must be written as EXR".into(),
        )),
    }
}

fn write_raw<W: Write>(
    data: &[u8],
    width: u32,
    height: u32,
    depth: BitDepth,
    writer: W,
    config: &PngConfig,
) -> Result<(), PngError> {
    let mut encoder = Encoder::new(writer, width, height);
    encoder.set_color(ColorType::Rgba);
    encoder.set_depth(depth);
    encoder.set_compression(config.compression);
    encoder.set_filter(config.filter);

    // The png crate writes no timestamps or other variable chunks.
    let mut png_writer = encoder.write_header()?;
    png_writer.write_image_data(data)?;
    Ok(())
}

/// PNG stores 16-bit samples big-endian.
fn rgba16_to_be_bytes(img: &Rgba16Image) -> Vec<u8> {
    img.as_raw().iter().flat_map(|s| s.to_be_bytes()).collect()
}

/// Compute the BLAKE3 hash of encoded file bytes.
pub fn hash_bytes(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

/// Encode to a `Vec<u8>` and return the bytes with their hash.
pub fn write_raster_to_vec_with_hash(
    raster: &TileRaster,
    config: &PngConfig,
) -> Result<(Vec<u8>, String), PngError> {
    let mut data = Vec::new();
    write_raster_to_writer(raster, &mut data, config)?;
    let hash = hash_bytes(&data);
    Ok((data, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use udimpack_spec::BitDepth as Depth;

    fn gradient(depth: Depth) -> TileRaster {
        let mut raster = TileRaster::filled(16, 16, depth, [0.0, 0.0, 0.0, 1.0]);
        for i in 0..16 {
            let stripe = TileRaster::filled(1, 16, Depth::U8, [i as f32 / 15.0, 0.5, 0.25, 1.0]);
            raster.paste(&stripe, i, 0);
        }
        raster
    }

    #[test]
    fn test_rgba8_deterministic() {
        let raster = gradient(Depth::U8);
        let config = PngConfig::default();

        let (data1, hash1) = write_raster_to_vec_with_hash(&raster, &config).unwrap();
        let (data2, hash2) = write_raster_to_vec_with_hash(&raster, &config).unwrap();

        assert_eq!(data1, data2, "PNG data should be identical");
        assert_eq!(hash1, hash2, "PNG hashes should be identical");
    }

    #[test]
    fn test_rgba16_decodes_back() {
        let raster = gradient(Depth::U16);
        let (data, _) = write_raster_to_vec_with_hash(&raster, &PngConfig::default()).unwrap();

        let decoded = image::load_from_memory(&data).unwrap();
        assert_eq!(decoded.color(), image::ColorType::Rgba16);
        assert_eq!(TileRaster::from_dynamic(decoded), raster);
    }

    #[test]
    fn test_float_rejected() {
        let raster = TileRaster::filled(2, 2, Depth::F32, [0.0; 4]);
        assert!(matches!(
            write_raster_to_vec_with_hash(&raster, &PngConfig::default()),
            Err(PngError::Unsupported(_))
        ));
    }
}
