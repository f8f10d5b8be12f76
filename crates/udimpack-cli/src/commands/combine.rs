//! Combine command implementation
//!
//! Packs the scene's UDIM tiles into fewer destination tiles and writes the
//! images, the rewritten scene and a report into a new run directory.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use colored::Colorize;
use udimpack_spec::RunReport;

use super::plan::print_plan;
use super::{resolve_config, ConfigOverrides, EXIT_OK, EXIT_PARTIAL};
use crate::input::{absolute_dir, load_scene};
use crate::merge::UvConcatMerger;
use crate::pipeline::{run_combine, RunOptions, RunOutcome};

/// Run the combine command
///
/// # Returns
/// Exit code: 0 if every unit succeeded, 3 if some failed. Input errors,
/// runs with nothing to process and output write failures are returned as
/// errors.
pub fn run(
    scene_path: &Path,
    out_root: &Path,
    config_path: Option<&Path>,
    overrides: &ConfigOverrides,
    objects: Vec<String>,
    json_output: bool,
) -> Result<ExitCode> {
    let config = resolve_config(config_path, overrides)?;
    let loaded = load_scene(scene_path)?;
    let stem = loaded.stem();
    let mut scene = loaded.scene;

    if !json_output {
        println!("{} {}", "Combining:".cyan().bold(), loaded.path.display());
        println!(
            "{} {} target tile(s){}",
            "Config:".dimmed(),
            config.target_tiles,
            if config.combine_objects {
                ", combined objects"
            } else {
                ""
            }
        );
    }

    let options = RunOptions {
        config,
        out_root: absolute_dir(out_root)?,
        selection: objects,
        timestamp_ms: None,
    };
    let outcome = run_combine(&mut scene, &stem, &options, None, &mut UvConcatMerger)?;

    if json_output {
        println!("{}", outcome.report.to_json_pretty()?);
    } else {
        print_outcome(&outcome);
    }

    Ok(if outcome.has_failures() {
        ExitCode::from(EXIT_PARTIAL)
    } else {
        ExitCode::from(EXIT_OK)
    })
}

fn print_outcome(outcome: &RunOutcome) {
    let report = &outcome.report;
    if let Some(plan) = &report.plan {
        println!();
        print_plan(plan);
    }

    if !report.outputs.is_empty() {
        println!();
        println!("{}", "Outputs:".bold());
        for output in &report.outputs {
            println!(
                "  {} {} {}x{} {}-bit",
                "ok".green(),
                output.path.display(),
                output.width,
                output.height,
                output.bit_depth.bits()
            );
        }
    }

    print_issues(report);

    println!();
    println!("{} {}", "Scene:".dimmed(), outcome.scene_path.display());
    println!("{} {}", "Report:".dimmed(), outcome.report_path.display());
    if report.ok {
        println!(
            "{} {} ({}ms)",
            "SUCCESS".green().bold(),
            report.set_name,
            report.duration_ms
        );
    } else {
        println!(
            "{} {} error(s); failed channels: {}",
            "PARTIAL".yellow().bold(),
            report.errors.len(),
            report.failed_channels().join(", ")
        );
    }
}

pub(crate) fn print_issues(report: &RunReport) {
    if !report.warnings.is_empty() {
        println!();
        println!("{}", "Warnings:".yellow().bold());
        for warning in &report.warnings {
            println!("  {} {}", "!".yellow(), warning);
        }
    }
    if !report.errors.is_empty() {
        println!();
        println!("{}", "Errors:".red().bold());
        for error in &report.errors {
            println!("  {} {}", "x".red(), error);
        }
    }
}
