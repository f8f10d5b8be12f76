//! Scene and configuration files.
//!
//! Image paths in a scene file are relative to the scene file's directory.
//! After loading they are rewritten to absolute paths so the scene can be
//! written anywhere (the run directory, in practice) and still resolve.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use udimpack_spec::scene::resolve_path;
use udimpack_spec::{RunConfig, Scene};

/// A scene read from disk.
#[derive(Debug)]
pub struct LoadedScene {
    pub scene: Scene,
    /// Absolute path of the scene file.
    pub path: PathBuf,
}

impl LoadedScene {
    /// File name without the `.json` extension, used for the written copy.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "scene".to_string())
    }
}

/// Reads, validates and rebases a scene file.
pub fn load_scene(path: &Path) -> Result<LoadedScene> {
    let path = path
        .canonicalize()
        .with_context(|| format!("Scene file not found: {}", path.display()))?;
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read scene file: {}", path.display()))?;
    let mut scene = Scene::from_json(&json)
        .with_context(|| format!("Invalid scene file: {}", path.display()))?;

    if let Some(base_dir) = path.parent() {
        rebase_image_paths(&mut scene, base_dir);
    }
    Ok(LoadedScene { scene, path })
}

/// Makes every relative image path absolute against `base_dir`.
pub fn rebase_image_paths(scene: &mut Scene, base_dir: &Path) {
    for image in &mut scene.images {
        image.path = resolve_path(base_dir, &image.path)
            .to_string_lossy()
            .into_owned();
    }
}

/// Writes a scene as pretty JSON.
pub fn write_scene(scene: &Scene, path: &Path) -> Result<()> {
    let json = scene.to_json_pretty().context("Failed to serialize scene")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write scene file: {}", path.display()))
}

/// Reads a run configuration; the default config when `path` is `None`.
pub fn load_config(path: Option<&Path>) -> Result<RunConfig> {
    let Some(path) = path else {
        return Ok(RunConfig::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    RunConfig::from_json(&json)
        .with_context(|| format!("Invalid config file: {}", path.display()))
}

/// Resolves a possibly relative directory against the current directory.
pub fn absolute_dir(dir: &Path) -> Result<PathBuf> {
    if dir.is_absolute() {
        return Ok(dir.to_path_buf());
    }
    let cwd = std::env::current_dir().context("Cannot determine current directory")?;
    Ok(cwd.join(dir))
}
