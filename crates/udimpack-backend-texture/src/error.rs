//! Error types for the texture backend.

use std::path::PathBuf;

use thiserror::Error;
use udimpack_spec::{BackendError, ChannelKind, TileIndex};

use crate::png::PngError;

/// Result type for texture I/O.
pub type TextureResult<T> = Result<T, TextureError>;

/// Errors from reading or writing image files.
#[derive(Debug, Error)]
pub enum TextureError {
    /// Source file does not exist.
    #[error("Image file not found: {path}")]
    NotFound { path: PathBuf },

    /// File exists but could not be decoded.
    #[error("Failed to decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Decoded image has no pixels.
    #[error("Image {path} has no pixel data")]
    Empty { path: PathBuf },

    /// PNG encoding failed.
    #[error("Failed to encode PNG: {0}")]
    Png(#[from] PngError),

    /// EXR (or other `image`-crate) encoding failed.
    #[error("Failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    /// IO error while writing outputs.
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TextureError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl BackendError for TextureError {
    fn code(&self) -> &'static str {
        match self {
            TextureError::NotFound { .. } => "TEXTURE_001",
            TextureError::Decode { .. } => "TEXTURE_002",
            TextureError::Empty { .. } => "TEXTURE_003",
            TextureError::Png(_) => "TEXTURE_004",
            TextureError::Encode(_) => "TEXTURE_005",
            TextureError::Io { .. } => "TEXTURE_006",
        }
    }

    fn category(&self) -> &'static str {
        "texture"
    }
}

/// Recoverable per-channel compositing failure.
///
/// A compositor returning this has produced no output for the channel; the
/// caller may hand the same plan and sources to another strategy.
#[derive(Debug, Error)]
pub enum CompositeError {
    /// A source tile image could not be read.
    #[error("Channel '{channel}': source tile {tile} is unreadable: {source}")]
    SourceUnreadable {
        channel: ChannelKind,
        tile: TileIndex,
        #[source]
        source: TextureError,
    },

    /// No planned tile has an image for the channel.
    #[error("Channel '{channel}' has no source images in the plan")]
    NoSources { channel: ChannelKind },

    /// The destination is too small to give a source tile any pixels.
    #[error("Channel '{channel}': {width}x{height} destination leaves no pixels for source tile {tile}")]
    CellTooSmall {
        channel: ChannelKind,
        tile: TileIndex,
        width: u32,
        height: u32,
    },

    /// The strategy cannot run in this environment.
    #[error("Compositing strategy '{strategy}' is not available")]
    Unavailable { strategy: &'static str },
}

impl BackendError for CompositeError {
    fn code(&self) -> &'static str {
        match self {
            CompositeError::SourceUnreadable { .. } => "COMPOSITE_001",
            CompositeError::NoSources { .. } => "COMPOSITE_002",
            CompositeError::Unavailable { .. } => "COMPOSITE_003",
            CompositeError::CellTooSmall { .. } => "COMPOSITE_004",
        }
    }

    fn category(&self) -> &'static str {
        "texture"
    }
}
