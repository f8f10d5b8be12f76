//! Doctor command implementation
//!
//! Checks that the tool can decode and encode images and write output.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use colored::Colorize;
use udimpack_backend_texture::{encode_raster, TileRaster};
use udimpack_spec::{BitDepth, OutputFormat};

use crate::input::absolute_dir;
use crate::logging::LOG_ENV;

/// Run the doctor command
///
/// Checks:
/// - Version information
/// - PNG and OpenEXR encoding
/// - Output directory permissions
///
/// # Returns
/// Exit code: 0 if all checks pass, 1 if any fail
pub fn run(out_root: &Path) -> Result<ExitCode> {
    println!("{}", "udimpack Doctor".cyan().bold());
    println!("{}", "===============".cyan());
    println!();

    let mut all_ok = true;

    println!("{}", "Versions:".bold());
    println!(
        "  {} udimpack-cli v{}",
        "->".green(),
        env!("CARGO_PKG_VERSION")
    );
    match std::env::var(LOG_ENV) {
        Ok(filter) => println!("  {} {}={}", "->".green(), LOG_ENV, filter),
        Err(_) => println!("  {} {} not set", "->".dimmed(), LOG_ENV),
    }
    println!();

    println!("{}", "Encoders:".bold());
    for (format, depth, label) in [
        (OutputFormat::Png, BitDepth::U8, "PNG 8-bit"),
        (OutputFormat::Png, BitDepth::U16, "PNG 16-bit"),
        (OutputFormat::Exr, BitDepth::F32, "OpenEXR float"),
    ] {
        match encode_raster(&TileRaster::filled(4, 4, depth, [0.5, 0.5, 1.0, 1.0]), format) {
            Ok((bytes, _, _)) => {
                println!("  {} {} ({} bytes)", "ok".green(), label, bytes.len())
            }
            Err(e) => {
                println!("  {} {}: {}", "!!".red(), label, e);
                all_ok = false;
            }
        }
    }
    println!();

    println!("{}", "Permissions:".bold());
    match check_writable(out_root) {
        Ok(dir) => println!(
            "  {} Output root is writable ({})",
            "ok".green(),
            dir.display()
        ),
        Err(e) => {
            println!("  {} Cannot write to output root: {}", "!!".red(), e);
            all_ok = false;
        }
    }
    println!();

    if all_ok {
        println!("{}", "All checks passed.".green().bold());
        Ok(ExitCode::SUCCESS)
    } else {
        println!("{}", "Some checks failed.".red().bold());
        Ok(ExitCode::from(1))
    }
}

fn check_writable(out_root: &Path) -> Result<std::path::PathBuf> {
    let dir = absolute_dir(out_root)?;
    std::fs::create_dir_all(&dir)?;
    let test_file = dir.join(".udimpack_write_test");
    std::fs::write(&test_file, "test")?;
    let _ = std::fs::remove_file(&test_file);
    Ok(dir)
}
