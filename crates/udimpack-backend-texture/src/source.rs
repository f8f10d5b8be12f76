//! Source tile loading.
//!
//! Each file is decoded at most once per run; every cell and every
//! destination referencing the same file shares the decoded raster.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::ImageReader;
use tracing::debug;

use crate::error::{TextureError, TextureResult};
use crate::raster::TileRaster;

/// Decodes an image file into a raster.
pub fn load_raster(path: &Path) -> TextureResult<TileRaster> {
    if !path.is_file() {
        return Err(TextureError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let decode_err = |source| TextureError::Decode {
        path: path.to_path_buf(),
        source,
    };
    let image = ImageReader::open(path)
        .map_err(|e| decode_err(image::ImageError::IoError(e)))?
        .with_guessed_format()
        .map_err(|e| decode_err(image::ImageError::IoError(e)))?
        .decode()
        .map_err(decode_err)?;

    if image.width() == 0 || image.height() == 0 {
        return Err(TextureError::Empty {
            path: path.to_path_buf(),
        });
    }
    Ok(TileRaster::from_dynamic(image))
}

/// Decoded source rasters keyed by file path.
#[derive(Debug, Default)]
pub struct SourceCache {
    entries: HashMap<PathBuf, Arc<TileRaster>>,
    decodes: usize,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the raster for `path`, decoding it on first use.
    ///
    /// Failures are not cached, so a later call retries the file.
    pub fn get(&mut self, path: &Path) -> TextureResult<Arc<TileRaster>> {
        if let Some(raster) = self.entries.get(path) {
            return Ok(Arc::clone(raster));
        }
        let raster = Arc::new(load_raster(path)?);
        self.decodes += 1;
        debug!(
            path = %path.display(),
            width = raster.width(),
            height = raster.height(),
            depth = ?raster.bit_depth(),
            "Decoded source tile"
        );
        self.entries.insert(path.to_path_buf(), Arc::clone(&raster));
        Ok(raster)
    }

    /// Number of files decoded so far.
    pub fn decode_count(&self) -> usize {
        self.decodes
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
