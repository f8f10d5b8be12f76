//! Compositor.
//!
//! Renders one destination image per (channel, destination tile) by copying
//! each source tile's full image into its grid cell. Pixel values are copied
//! verbatim; only resampling to the cell size changes them, and only when
//! the sizes differ.
//!
//! UV space has its origin at the bottom-left, image rows start at the top.
//! [`cell_pixel_rect`] is the one place that converts between the two.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};
use udimpack_spec::{
    BitDepth, CellPlacement, ChannelKind, Colorspace, GridPlan, ResolutionPolicy, TileIndex,
};

use crate::error::CompositeError;
use crate::raster::TileRaster;
use crate::resolution::destination_size;
use crate::source::SourceCache;

/// The source images of one channel, by source tile.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSources {
    pub channel: ChannelKind,
    /// Tag inherited by every destination image of the channel.
    pub colorspace: Colorspace,
    /// File holding each source tile's image. Tiles without an entry get
    /// the channel's fill value.
    pub tiles: BTreeMap<TileIndex, PathBuf>,
}

/// Options shared by all strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositeOptions {
    pub resolution: ResolutionPolicy,
    /// Use the channel's neutral value for empty cells instead of transparent black.
    pub fill_unassigned_cells: bool,
}

impl Default for CompositeOptions {
    fn default() -> Self {
        Self {
            resolution: ResolutionPolicy::Source,
            fill_unassigned_cells: true,
        }
    }
}

/// One composited image, not yet written to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct DestinationImage {
    pub channel: ChannelKind,
    pub tile: TileIndex,
    pub colorspace: Colorspace,
    pub raster: TileRaster,
}

/// Produces destination images for one channel from a grid plan.
///
/// Implementations either return an image for every destination tile of
/// the plan or an error; never a partial set.
pub trait CompositeStrategy {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    fn composite(
        &mut self,
        plan: &GridPlan,
        sources: &ChannelSources,
        options: &CompositeOptions,
    ) -> Result<Vec<DestinationImage>, CompositeError>;
}

/// A rectangle in pixel space, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Pixel rectangle of a grid cell in a `width` x `height` destination.
pub fn cell_pixel_rect(placement: &CellPlacement, width: u32, height: u32) -> PixelRect {
    let rect = placement.uv_rect();
    let (w, h) = (f64::from(width), f64::from(height));
    let x0 = (rect.u_min * w).round() as u32;
    let x1 = (rect.u_max * w).round() as u32;
    // v grows upward, rows grow downward.
    let y0 = ((1.0 - rect.v_max) * h).round() as u32;
    let y1 = ((1.0 - rect.v_min) * h).round() as u32;
    PixelRect {
        x: x0,
        y: y0,
        width: x1.saturating_sub(x0),
        height: y1.saturating_sub(y0),
    }
}

/// Composites from decoded source files.
#[derive(Debug, Default)]
pub struct RasterCompositor {
    cache: SourceCache,
}

impl RasterCompositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoded-source cache shared across channels.
    pub fn cache(&self) -> &SourceCache {
        &self.cache
    }

    /// Decodes every source referenced by the plan, failing on the first
    /// unreadable one.
    fn load_sources(
        &mut self,
        plan: &GridPlan,
        sources: &ChannelSources,
    ) -> Result<BTreeMap<TileIndex, Arc<TileRaster>>, CompositeError> {
        let mut loaded = BTreeMap::new();
        for tile in plan.source_tiles() {
            let Some(path) = sources.tiles.get(&tile) else {
                debug!(channel = %sources.channel, tile = %tile, "No source image, cell will be filled");
                continue;
            };
            let raster = self
                .cache
                .get(path)
                .map_err(|source| CompositeError::SourceUnreadable {
                    channel: sources.channel.clone(),
                    tile,
                    source,
                })?;
            loaded.insert(tile, raster);
        }
        Ok(loaded)
    }
}

impl CompositeStrategy for RasterCompositor {
    fn name(&self) -> &'static str {
        "raster"
    }

    fn composite(
        &mut self,
        plan: &GridPlan,
        sources: &ChannelSources,
        options: &CompositeOptions,
    ) -> Result<Vec<DestinationImage>, CompositeError> {
        let loaded = self.load_sources(plan, sources)?;
        if loaded.is_empty() {
            return Err(CompositeError::NoSources {
                channel: sources.channel.clone(),
            });
        }

        let depth = loaded
            .values()
            .map(|r| r.bit_depth())
            .max()
            .unwrap_or(BitDepth::U8);
        let sizes: Vec<(u32, u32)> = loaded.values().map(|r| r.dimensions()).collect();
        let (width, height) = destination_size(options.resolution, &sizes, plan);
        let fill = if options.fill_unassigned_cells {
            sources.channel.fill()
        } else {
            [0.0; 4]
        };

        let mut images = Vec::with_capacity(plan.destinations.len());
        for dest in &plan.destinations {
            let mut raster = TileRaster::filled(width, height, depth, fill);
            for (index, source_tile) in dest.cells.iter().enumerate() {
                let (Some(source), Some(placement)) = (loaded.get(source_tile), dest.placement(index))
                else {
                    continue;
                };
                let rect = cell_pixel_rect(&placement, width, height);
                if rect.width == 0 || rect.height == 0 {
                    return Err(CompositeError::CellTooSmall {
                        channel: sources.channel.clone(),
                        tile: *source_tile,
                        width,
                        height,
                    });
                }
                let cell = source.widened(depth).resized(rect.width, rect.height);
                raster.paste(&cell, rect.x, rect.y);
            }
            images.push(DestinationImage {
                channel: sources.channel.clone(),
                tile: dest.tile,
                colorspace: sources.colorspace,
                raster,
            });
        }

        info!(
            channel = %sources.channel,
            destinations = images.len(),
            width,
            height,
            depth = ?depth,
            "Composited channel"
        );
        Ok(images)
    }
}
