//! Test harness for running combines and checking their outputs.

use std::path::{Path, PathBuf};

use image::RgbaImage;
use tempfile::TempDir;
use udimpack_cli::merge::UvConcatMerger;
use udimpack_cli::{run_combine, RunOptions, RunOutcome};
use udimpack_spec::{RunConfig, Scene, TileIndex};

/// Run timestamp used by every harness run, so run directories are predictable.
pub const TIMESTAMP_MS: i64 = 1_700_000_000_000;

/// A temporary workspace with a texture directory and an output root.
pub struct TestHarness {
    pub work_dir: TempDir,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarness {
    pub fn new() -> Self {
        Self {
            work_dir: TempDir::new().expect("Failed to create work dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.work_dir.path()
    }

    /// Directory for source textures; created on first use.
    pub fn textures_dir(&self) -> PathBuf {
        let dir = self.path().join("textures");
        std::fs::create_dir_all(&dir).expect("Failed to create textures dir");
        dir
    }

    pub fn out_root(&self) -> PathBuf {
        self.path().join("out")
    }

    /// Runs a combine over every object with the file-host merger.
    pub fn run(&self, scene: &mut Scene, config: RunConfig) -> anyhow::Result<RunOutcome> {
        let options = RunOptions {
            timestamp_ms: Some(TIMESTAMP_MS),
            ..RunOptions::new(config, self.out_root())
        };
        run_combine(scene, "scene", &options, None, &mut UvConcatMerger)
    }
}

/// Reads an image file as 8-bit RGBA.
pub fn load_rgba(path: &Path) -> RgbaImage {
    image::open(path)
        .unwrap_or_else(|e| panic!("Failed to open {}: {}", path.display(), e))
        .to_rgba8()
}

/// Pixel under a UV coordinate in the image of destination tile `tile`.
///
/// Pixel rows run top to bottom while V runs bottom to top.
pub fn sample_uv(image: &RgbaImage, tile: TileIndex, uv: [f64; 2]) -> [u8; 4] {
    let [u0, v0] = tile.origin();
    let (width, height) = image.dimensions();
    let x = ((uv[0] - u0) * width as f64).floor().clamp(0.0, (width - 1) as f64) as u32;
    let y = ((1.0 - (uv[1] - v0)) * height as f64)
        .floor()
        .clamp(0.0, (height - 1) as f64) as u32;
    image.get_pixel(x, y).0
}

/// Asserts two colors differ by at most `tolerance` per channel.
pub fn assert_color_near(actual: [u8; 4], expected: [u8; 4], tolerance: u8) {
    for (a, e) in actual.iter().zip(expected.iter()) {
        assert!(
            a.abs_diff(*e) <= tolerance,
            "color {:?} differs from expected {:?}",
            actual,
            expected
        );
    }
}
