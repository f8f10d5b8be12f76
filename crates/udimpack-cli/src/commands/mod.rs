//! CLI command implementations

pub mod combine;
pub mod doctor;
pub mod inspect;
pub mod plan;

use std::path::Path;

use anyhow::{Context, Result};
use udimpack_spec::{OutputFormat, ResolutionPolicy, RunConfig};

use crate::input::load_config;
use crate::pipeline::{NothingToProcess, OutputWriteFailed};

/// Every unit succeeded.
pub const EXIT_OK: u8 = 0;
/// Invalid input or configuration.
pub const EXIT_INPUT: u8 = 1;
/// No object or texture to work with.
pub const EXIT_NOTHING_TO_PROCESS: u8 = 2;
/// The run finished but some units failed.
pub const EXIT_PARTIAL: u8 = 3;
/// The run directory, scene or report could not be written.
pub const EXIT_OUTPUT: u8 = 4;

/// Exit code for a command that returned an error.
pub fn error_exit_code(err: &anyhow::Error) -> u8 {
    if err.downcast_ref::<NothingToProcess>().is_some() {
        EXIT_NOTHING_TO_PROCESS
    } else if err.downcast_ref::<OutputWriteFailed>().is_some() {
        EXIT_OUTPUT
    } else {
        EXIT_INPUT
    }
}

/// Command-line values that override the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub target_tiles: Option<u32>,
    pub combine_objects: Option<bool>,
    pub set_name: Option<String>,
    pub resolution: Option<ResolutionPolicy>,
    pub output_format: Option<OutputFormat>,
    pub fill_unassigned_cells: Option<bool>,
}

impl ConfigOverrides {
    pub fn apply(&self, config: &mut RunConfig) {
        if let Some(target_tiles) = self.target_tiles {
            config.target_tiles = target_tiles;
        }
        if let Some(combine) = self.combine_objects {
            config.combine_objects = combine;
        }
        if let Some(name) = &self.set_name {
            config.set_name = Some(name.clone());
        }
        if let Some(resolution) = self.resolution {
            config.resolution = resolution;
        }
        if let Some(format) = self.output_format {
            config.output_format = format;
        }
        if let Some(fill) = self.fill_unassigned_cells {
            config.fill_unassigned_cells = fill;
        }
    }
}

/// Loads the config file (if any), applies overrides and validates.
pub fn resolve_config(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<RunConfig> {
    let mut config = load_config(path)?;
    overrides.apply(&mut config);
    config.validate().context("Invalid run configuration")?;
    Ok(config)
}

/// Parses `source`, `lossless` or a pixel size.
pub fn parse_resolution(s: &str) -> Result<ResolutionPolicy, String> {
    match s {
        "source" => Ok(ResolutionPolicy::Source),
        "lossless" => Ok(ResolutionPolicy::Lossless),
        px => px.parse::<u32>().map(ResolutionPolicy::Fixed).map_err(|_| {
            format!(
                "invalid resolution '{}' (expected source, lossless or a pixel size)",
                px
            )
        }),
    }
}

/// Parses `auto`, `png` or `exr`.
pub fn parse_format(s: &str) -> Result<OutputFormat, String> {
    match s {
        "auto" => Ok(OutputFormat::Auto),
        "png" => Ok(OutputFormat::Png),
        "exr" => Ok(OutputFormat::Exr),
        other => Err(format!(
            "invalid format '{}' (expected auto, png or exr)",
            other
        )),
    }
}
