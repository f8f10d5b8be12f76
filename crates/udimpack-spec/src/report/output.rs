//! Output entries for reports.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::channel::{ChannelKind, Colorspace};
use crate::tile::TileIndex;

/// Per-sample storage of a destination image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BitDepth {
    /// 8-bit unsigned integer RGBA.
    U8,
    /// 16-bit unsigned integer RGBA.
    U16,
    /// 32-bit float RGBA.
    F32,
}

impl BitDepth {
    /// Bits per channel sample.
    pub fn bits(&self) -> u32 {
        match self {
            BitDepth::U8 => 8,
            BitDepth::U16 => 16,
            BitDepth::F32 => 32,
        }
    }
}

/// One persisted destination image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputRecord {
    pub channel: ChannelKind,
    /// Destination tile the image covers.
    pub tile: TileIndex,
    /// Path of the written file.
    pub path: PathBuf,
    /// Hex-encoded BLAKE3 hash of the file contents.
    pub hash: String,
    pub width: u32,
    pub height: u32,
    pub bit_depth: BitDepth,
    /// Inherited unchanged from the channel's source record.
    pub colorspace: Colorspace,
}
