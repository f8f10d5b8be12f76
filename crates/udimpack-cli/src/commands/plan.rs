//! Plan command implementation
//!
//! Shows where each source tile and object would land without writing
//! anything.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::Colorize;
use udimpack_layout::plan_grid;
use udimpack_spec::GridPlan;

use super::{resolve_config, ConfigOverrides};
use crate::input::load_scene;
use crate::pipeline::analyze;

/// Run the plan command
///
/// # Returns
/// Exit code: 0 once the plan is printed
pub fn run(
    scene_path: &Path,
    config_path: Option<&Path>,
    overrides: &ConfigOverrides,
    objects: Vec<String>,
    json_output: bool,
) -> Result<ExitCode> {
    let config = resolve_config(config_path, overrides)?;
    let loaded = load_scene(scene_path)?;
    let analysis = analyze(&loaded.scene, &objects)?;
    analysis.require_objects()?;

    let plan = plan_grid(analysis.located.source_tiles(), config.target_tiles)
        .context("Failed to plan destination grid")?;

    if json_output {
        let objects: Vec<serde_json::Value> = analysis
            .located
            .assignments
            .iter()
            .map(|a| {
                let placement = plan.placement_of(a.tile);
                serde_json::json!({
                    "object": a.object,
                    "source": a.tile.udim(),
                    "destination": placement.map(|p| p.destination.udim()),
                    "row": placement.map(|p| p.row),
                    "col": placement.map(|p| p.col),
                })
            })
            .collect();
        let output = serde_json::json!({
            "plan": plan,
            "objects": objects,
            "errors": analysis.errors,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(ExitCode::SUCCESS);
    }

    println!("{} {}", "Planning:".cyan().bold(), loaded.path.display());
    println!(
        "{} {} source tile(s) into {} target tile(s)",
        "Config:".dimmed(),
        analysis.located.source_tiles().len(),
        config.target_tiles
    );
    println!();
    print_plan(&plan);

    println!();
    println!("{}", "Objects:".bold());
    for assignment in &analysis.located.assignments {
        match plan.placement_of(assignment.tile) {
            Some(placement) => println!(
                "  {} {} {} -> {} (row {}, col {})",
                "->".green(),
                assignment.object,
                assignment.tile.udim(),
                placement.destination.udim(),
                placement.row,
                placement.col
            ),
            None => println!(
                "  {} {} {} is not in the plan",
                "!!".red(),
                assignment.object,
                assignment.tile.udim()
            ),
        }
    }
    for error in &analysis.errors {
        println!("  {} {}", "x".red(), error);
    }

    Ok(ExitCode::SUCCESS)
}

/// Prints one line per destination tile with its grid and source tiles.
pub(crate) fn print_plan(plan: &GridPlan) {
    println!("{}", "Grid:".bold());
    for destination in &plan.destinations {
        let cells: Vec<String> = destination
            .cells
            .iter()
            .map(|t| t.udim().to_string())
            .collect();
        println!(
            "  {} {} [{}x{}] <- {}",
            "->".green(),
            destination.tile.udim(),
            destination.shape.cols,
            destination.shape.rows,
            cells.join(", ")
        );
    }
}
