//! Output directory and file naming.
//!
//! A run writes into `<out_root>/<set>_<timestamp>/` and names each
//! destination image `<set>_<timestamp>_<Channel>.<UDIM>.<ext>`.

use crate::channel::ChannelKind;
use crate::tile::TileIndex;

/// Set identifier used when objects are not combined.
pub const DEFAULT_SET_NAME: &str = "TextureSet";

/// Picks the texture-set identifier for a run.
///
/// An explicit override wins. When combining objects the first object's
/// name is used with `.` replaced by `_`; otherwise [`DEFAULT_SET_NAME`].
pub fn set_name(
    override_name: Option<&str>,
    combine_objects: bool,
    first_object: Option<&str>,
) -> String {
    if let Some(name) = override_name {
        return name.to_string();
    }
    match (combine_objects, first_object) {
        (true, Some(object)) => object.replace('.', "_"),
        _ => DEFAULT_SET_NAME.to_string(),
    }
}

/// Directory (and file prefix) for one run.
pub fn run_stem(set_name: &str, timestamp_ms: i64) -> String {
    format!("{}_{}", set_name, timestamp_ms)
}

/// File name of one destination image.
pub fn image_file_name(stem: &str, channel: &ChannelKind, tile: TileIndex, ext: &str) -> String {
    format!("{}_{}.{}.{}", stem, channel.file_token(), tile.udim(), ext)
}

/// Tiled-image path pattern with the UDIM marker in place of the tile number.
pub fn image_file_pattern(stem: &str, channel: &ChannelKind, ext: &str) -> String {
    format!("{}_{}.{}.{}", stem, channel.file_token(), crate::scene::UDIM_MARKER, ext)
}

/// Name of the tiled image entry bound to materials for a channel.
pub fn image_entry_name(set_name: &str, channel: &ChannelKind) -> String {
    format!("{}_{}", set_name, channel.file_token())
}
