//! Destination image sizing.

use udimpack_spec::{GridPlan, ResolutionPolicy};

/// Size used when a channel has no measurable source.
pub const DEFAULT_RESOLUTION: u32 = 2048;

/// Bounds applied to the lossless policy.
pub const LOSSLESS_MIN: u32 = 512;
pub const LOSSLESS_MAX: u32 = 8192;

/// Width and height of every destination image of one channel.
///
/// `source_sizes` are the dimensions of the channel's source tiles.
pub fn destination_size(
    policy: ResolutionPolicy,
    source_sizes: &[(u32, u32)],
    plan: &GridPlan,
) -> (u32, u32) {
    match policy {
        ResolutionPolicy::Fixed(px) => (px, px),
        ResolutionPolicy::Source => {
            let width = source_sizes.iter().map(|s| s.0).max();
            let height = source_sizes.iter().map(|s| s.1).max();
            match (width, height) {
                (Some(w), Some(h)) => (w, h),
                _ => (DEFAULT_RESOLUTION, DEFAULT_RESOLUTION),
            }
        }
        ResolutionPolicy::Lossless => {
            let Some(max_dim) = source_sizes.iter().map(|&(w, h)| w.max(h)).max() else {
                return (DEFAULT_RESOLUTION, DEFAULT_RESOLUTION);
            };
            let wanted = max_dim.saturating_mul(plan.max_cols());
            let side = wanted
                .checked_next_power_of_two()
                .unwrap_or(LOSSLESS_MAX)
                .clamp(LOSSLESS_MIN, LOSSLESS_MAX);
            (side, side)
        }
    }
}
