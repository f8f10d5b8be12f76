//! Run configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest destination edge length accepted for fixed resolutions.
pub const MAX_RESOLUTION: u32 = 16384;

/// Default destination tile count.
pub const DEFAULT_TARGET_TILES: u32 = 2;

/// Errors from validating a [`RunConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("target_tiles must be at least 1")]
    ZeroTargetTiles,

    #[error("fixed resolution {0} is outside 1..=16384")]
    ResolutionOutOfRange(u32),

    #[error("set_name must not be empty or contain path separators: '{0}'")]
    InvalidSetName(String),

    #[error("failed to parse config JSON: {0}")]
    Parse(String),
}

/// How large each destination tile image is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPolicy {
    /// The largest source tile of the channel governs.
    #[default]
    Source,
    /// Large enough to keep every source pixel: source size times the widest
    /// grid, rounded up to a power of two and clamped to 512..=8192.
    Lossless,
    /// Square destination with the given edge length.
    Fixed(u32),
}

/// File format for destination images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// PNG for 8/16-bit channels, OpenEXR for float channels.
    #[default]
    Auto,
    Png,
    Exr,
}

/// Options for one combine run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Destination tile count `M`.
    pub target_tiles: u32,
    /// Merge objects into one and share a single material.
    pub combine_objects: bool,
    pub resolution: ResolutionPolicy,
    /// Texture-set identifier; derived from the selection when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_name: Option<String>,
    pub output_format: OutputFormat,
    /// Fill empty cells with the channel's neutral value (otherwise transparent black).
    pub fill_unassigned_cells: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            target_tiles: DEFAULT_TARGET_TILES,
            combine_objects: false,
            resolution: ResolutionPolicy::Source,
            set_name: None,
            output_format: OutputFormat::Auto,
            fill_unassigned_cells: true,
        }
    }
}

impl RunConfig {
    /// Parses a config from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: RunConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_tiles == 0 {
            return Err(ConfigError::ZeroTargetTiles);
        }
        if let ResolutionPolicy::Fixed(px) = self.resolution {
            if !(1..=MAX_RESOLUTION).contains(&px) {
                return Err(ConfigError::ResolutionOutOfRange(px));
            }
        }
        if let Some(name) = &self.set_name {
            if name.is_empty() || name.contains(['/', '\\']) {
                return Err(ConfigError::InvalidSetName(name.clone()));
            }
        }
        Ok(())
    }
}
