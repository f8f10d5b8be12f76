//! Writing destination images to disk.

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat};
use tracing::{debug, warn};
use udimpack_spec::naming::image_file_name;
use udimpack_spec::{BitDepth, OutputFormat, OutputRecord};

use crate::composite::DestinationImage;
use crate::error::{TextureError, TextureResult};
use crate::png::{hash_bytes, write_raster_to_vec_with_hash, PngConfig};
use crate::raster::TileRaster;

/// File extension for a channel of the given depth.
pub fn extension_for(format: OutputFormat, depth: BitDepth) -> &'static str {
    match (format, depth) {
        (OutputFormat::Exr, _) | (OutputFormat::Auto, BitDepth::F32) => "exr",
        (OutputFormat::Png, _) | (OutputFormat::Auto, _) => "png",
    }
}

/// Encodes a raster in the container chosen by `format`.
///
/// Returns the file bytes, their hash and the depth actually stored. PNG
/// cannot hold float samples, so float rasters are narrowed to 16-bit;
/// OpenEXR always stores float.
pub fn encode_raster(
    raster: &TileRaster,
    format: OutputFormat,
) -> TextureResult<(Vec<u8>, String, BitDepth)> {
    match extension_for(format, raster.bit_depth()) {
        "exr" => {
            let float = match raster {
                TileRaster::Rgba32F(img) => img.clone(),
                other => other.to_dynamic().into_rgba32f(),
            };
            let mut data = Vec::new();
            DynamicImage::ImageRgba32F(float)
                .write_to(&mut Cursor::new(&mut data), ImageFormat::OpenExr)
                .map_err(TextureError::Encode)?;
            let hash = hash_bytes(&data);
            Ok((data, hash, BitDepth::F32))
        }
        _ => {
            let config = PngConfig::default();
            if raster.bit_depth() == BitDepth::F32 {
                let narrowed = raster.to_depth_lossy(BitDepth::U16);
                let (data, hash) = write_raster_to_vec_with_hash(&narrowed, &config)?;
                Ok((data, hash, BitDepth::U16))
            } else {
                let (data, hash) = write_raster_to_vec_with_hash(raster, &config)?;
                Ok((data, hash, raster.bit_depth()))
            }
        }
    }
}

/// Writes one destination image into `dir` and describes it.
///
/// The file is named `<stem>_<Channel>.<UDIM>.<ext>`.
pub fn write_destination(
    image: &DestinationImage,
    dir: &Path,
    stem: &str,
    format: OutputFormat,
) -> TextureResult<OutputRecord> {
    let depth = image.raster.bit_depth();
    if format == OutputFormat::Png && depth == BitDepth::F32 {
        warn!(
            channel = %image.channel,
            tile = %image.tile,
            "Float channel written as 16-bit PNG; values outside 0..1 are clamped"
        );
    }

    let (data, hash, stored_depth) = encode_raster(&image.raster, format)?;
    let ext = extension_for(format, depth);
    let path = dir.join(image_file_name(stem, &image.channel, image.tile, ext));
    std::fs::write(&path, &data).map_err(|e| TextureError::io(&path, e))?;

    debug!(
        path = %path.display(),
        bytes = data.len(),
        hash = %hash,
        "Wrote destination image"
    );

    Ok(OutputRecord {
        channel: image.channel.clone(),
        tile: image.tile,
        path,
        hash,
        width: image.raster.width(),
        height: image.raster.height(),
        bit_depth: stored_depth,
        colorspace: image.colorspace,
    })
}

/// Writes every image of one channel. Stops at the first failure.
pub fn write_destinations(
    images: &[DestinationImage],
    dir: &Path,
    stem: &str,
    format: OutputFormat,
) -> TextureResult<Vec<OutputRecord>> {
    std::fs::create_dir_all(dir).map_err(|e| TextureError::io(dir, e))?;
    images
        .iter()
        .map(|image| write_destination(image, dir, stem, format))
        .collect()
}
