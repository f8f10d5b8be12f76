//! Inspect command implementation
//!
//! Summarizes a scene: tiles in use, object tiles and material channels.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use colored::Colorize;
use udimpack_layout::touched_tiles;

use crate::input::load_scene;
use crate::pipeline::analyze;

/// Run the inspect command
///
/// # Returns
/// Exit code: 0 if the scene was read, 1 if any object or material has problems
pub fn run(scene_path: &Path, objects: Vec<String>, json_output: bool) -> Result<ExitCode> {
    let loaded = load_scene(scene_path)?;
    let scene = &loaded.scene;
    let analysis = analyze(scene, &objects)?;
    let touched = touched_tiles(
        analysis
            .objects
            .iter()
            .filter_map(|name| scene.object(name)),
    );

    let exit = if analysis.errors.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(super::EXIT_INPUT)
    };

    if json_output {
        let materials: Vec<serde_json::Value> = analysis
            .detected
            .iter()
            .map(|d| {
                serde_json::json!({
                    "material": d.material,
                    "channels": d.records.iter().map(|r| serde_json::json!({
                        "channel": r.channel,
                        "image": r.image,
                        "colorspace": r.colorspace,
                    })).collect::<Vec<_>>(),
                })
            })
            .collect();
        let output = serde_json::json!({
            "touched_tiles": touched.iter().map(|t| t.udim()).collect::<Vec<_>>(),
            "objects": analysis.located.assignments.iter().map(|a| serde_json::json!({
                "object": a.object,
                "tile": a.tile.udim(),
                "uv_count": a.uv_count,
            })).collect::<Vec<_>>(),
            "materials": materials,
            "errors": analysis.errors,
            "warnings": analysis.warnings,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(exit);
    }

    println!("{} {}", "Inspecting:".cyan().bold(), loaded.path.display());
    let tiles: Vec<String> = touched.iter().map(|t| t.udim().to_string()).collect();
    println!(
        "{} {} tile(s) touched: {}",
        "UVs:".dimmed(),
        touched.len(),
        tiles.join(", ")
    );

    println!();
    println!("{}", "Objects:".bold());
    for assignment in &analysis.located.assignments {
        let marker = if assignment.bounds.spans_multiple_tiles() {
            "!".yellow()
        } else {
            "ok".green()
        };
        println!(
            "  {} {} -> {} ({} UVs)",
            marker,
            assignment.object,
            assignment.tile.udim(),
            assignment.uv_count
        );
    }

    println!();
    println!("{}", "Materials:".bold());
    for detected in &analysis.detected {
        println!("  {}", detected.material);
        if detected.is_empty() {
            println!("     {}", "no texture channels".dimmed());
        }
        for record in &detected.records {
            println!(
                "     {} {} <- {} ({})",
                "->".green(),
                record.channel,
                record.image,
                record.colorspace.as_str()
            );
        }
    }

    for warning in &analysis.warnings {
        println!("  {} {}", "!".yellow(), warning);
    }
    for error in &analysis.errors {
        println!("  {} {}", "x".red(), error);
    }

    Ok(exit)
}
