//! udimpack CLI - packs a UDIM texture set into fewer tiles
//!
//! Exit codes: 0 success, 1 invalid input or configuration, 2 nothing to
//! process, 3 finished with failed units (see the run report), 4 the run's
//! directory, scene or report could not be written.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use udimpack_cli::commands::{
    self, error_exit_code, parse_format, parse_resolution, ConfigOverrides,
};
use udimpack_cli::logging;
use udimpack_spec::{OutputFormat, ResolutionPolicy};

/// udimpack - Combine UDIM tiles into fewer tiles
#[derive(Parser)]
#[command(name = "udimpack")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Log debug output (overridden by UDIMPACK_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by commands that read a run configuration.
#[derive(Args, Debug)]
struct RunArgs {
    /// Path to the scene JSON file
    #[arg(short, long)]
    scene: PathBuf,

    /// Run configuration JSON file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of destination tiles
    #[arg(short = 't', long)]
    target_tiles: Option<u32>,

    /// Merge the objects and give them one shared material
    #[arg(long, overrides_with = "no_combine_objects")]
    combine_objects: bool,

    /// Keep objects separate even if the config file combines them
    #[arg(long, overrides_with = "combine_objects")]
    no_combine_objects: bool,

    /// Texture-set name used for output files and image entries
    #[arg(long)]
    set_name: Option<String>,

    /// Destination size: source, lossless or a pixel size
    #[arg(long, value_parser = parse_resolution)]
    resolution: Option<ResolutionPolicy>,

    /// Image format: auto, png or exr
    #[arg(long, value_parser = parse_format)]
    format: Option<OutputFormat>,

    /// Fill empty grid cells with the channel's neutral value
    #[arg(long, overrides_with = "no_fill")]
    fill: bool,

    /// Leave empty grid cells transparent instead of filling them
    #[arg(long, overrides_with = "fill")]
    no_fill: bool,

    /// Only process these objects (repeatable)
    #[arg(short, long = "object")]
    objects: Vec<String>,

    /// Output machine-readable JSON instead of colored text
    #[arg(long)]
    json: bool,
}

/// `Some(true)` for `--flag`, `Some(false)` for `--no-flag`, `None` when neither is given.
fn flag_pair(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

impl RunArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            target_tiles: self.target_tiles,
            combine_objects: flag_pair(self.combine_objects, self.no_combine_objects),
            set_name: self.set_name.clone(),
            resolution: self.resolution,
            output_format: self.format,
            fill_unassigned_cells: flag_pair(self.fill, self.no_fill),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Combine the scene's tiles and write images, scene and report
    Combine {
        #[command(flatten)]
        run: RunArgs,

        /// Directory that receives the run directory
        #[arg(long, default_value = ".")]
        out_root: PathBuf,
    },

    /// Preview the tile grid without writing anything
    Plan {
        #[command(flatten)]
        run: RunArgs,
    },

    /// Summarize UV tiles and texture channels of a scene
    Inspect {
        /// Path to the scene JSON file
        #[arg(short, long)]
        scene: PathBuf,

        /// Only inspect these objects (repeatable)
        #[arg(short, long = "object")]
        objects: Vec<String>,

        /// Output machine-readable JSON instead of colored text
        #[arg(long)]
        json: bool,
    },

    /// Check encoders and output permissions
    Doctor {
        /// Directory to test for write access
        #[arg(long, default_value = ".")]
        out_root: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Combine { run, out_root } => commands::combine::run(
            &run.scene,
            &out_root,
            run.config.as_deref(),
            &run.overrides(),
            run.objects,
            run.json,
        ),
        Commands::Plan { run } => commands::plan::run(
            &run.scene,
            run.config.as_deref(),
            &run.overrides(),
            run.objects,
            run.json,
        ),
        Commands::Inspect {
            scene,
            objects,
            json,
        } => commands::inspect::run(&scene, objects, json),
        Commands::Doctor { out_root } => commands::doctor::run(&out_root),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(error_exit_code(&e))
        }
    }
}
