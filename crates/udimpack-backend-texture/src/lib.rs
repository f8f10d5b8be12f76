//! udimpack texture backend
//!
//! Builds the destination images of a combine run from the source tile
//! images, following a grid plan produced by the layout stage.
//!
//! # Features
//!
//! - **Source loading**: each file decoded once per run and shared between channels
//! - **Raster compositing**: full-tile copies into grid cells, resampled only when sizes differ
//! - **Bit depth**: 8-bit, 16-bit and float sources; a channel takes its deepest source's depth
//! - **Deterministic output**: fixed PNG settings and BLAKE3 file hashes
//!
//! # Example
//!
//! ```no_run
//! use std::collections::BTreeMap;
//! use std::path::{Path, PathBuf};
//!
//! use udimpack_backend_texture::{
//!     write_destinations, ChannelSources, CompositeOptions, CompositeStrategy, RasterCompositor,
//! };
//! use udimpack_layout::plan_grid;
//! use udimpack_spec::{ChannelKind, Colorspace, OutputFormat, TileIndex};
//!
//! let t1 = TileIndex::from_udim(1001).unwrap();
//! let t2 = TileIndex::from_udim(1002).unwrap();
//! let plan = plan_grid([t1, t2], 1).unwrap();
//!
//! let sources = ChannelSources {
//!     channel: ChannelKind::from_name("Base Color"),
//!     colorspace: Colorspace::Color,
//!     tiles: BTreeMap::from([
//!         (t1, PathBuf::from("textures/albedo.1001.png")),
//!         (t2, PathBuf::from("textures/albedo.1002.png")),
//!     ]),
//! };
//!
//! let mut compositor = RasterCompositor::new();
//! let images = compositor
//!     .composite(&plan, &sources, &CompositeOptions::default())
//!     .unwrap();
//! write_destinations(&images, Path::new("out"), "Crate_0", OutputFormat::Auto).unwrap();
//! ```

pub mod composite;
pub mod error;
pub mod output;
pub mod png;
pub mod raster;
pub mod resolution;
pub mod source;

pub use composite::{
    cell_pixel_rect, ChannelSources, CompositeOptions, CompositeStrategy, DestinationImage,
    PixelRect, RasterCompositor,
};
pub use error::{CompositeError, TextureError, TextureResult};
pub use output::{encode_raster, extension_for, write_destination, write_destinations};
pub use png::{PngConfig, PngError};
pub use raster::TileRaster;
pub use resolution::destination_size;
pub use source::{load_raster, SourceCache};
