//! Host scene snapshot.
//!
//! The scene is the boundary to the host application: objects with their UV
//! coordinates, materials with their node graphs, and image entries with
//! colorspace metadata. It is read once per run and written back with the
//! new UVs and image bindings afterwards.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::channel::Colorspace;
use crate::graph::{GraphError, LinkSpec, MaterialGraph, NodeSpec};
use crate::tile::TileIndex;

/// Marker replaced by the UDIM number in tiled image paths.
pub const UDIM_MARKER: &str = "<UDIM>";

/// Errors raised while loading or validating a scene.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("Failed to parse scene JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate {kind} name '{name}'")]
    DuplicateName { kind: &'static str, name: String },

    #[error("Object '{object}' references unknown material '{material}'")]
    UnknownMaterial { object: String, material: String },

    #[error("Material '{material}' has an invalid node graph: {source}")]
    InvalidGraph {
        material: String,
        #[source]
        source: GraphError,
    },

    #[error("Tiled image '{0}' has no <UDIM> marker in its path")]
    MissingUdimMarker(String),
}

/// An image known to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageEntry {
    pub name: String,
    /// File path; contains [`UDIM_MARKER`] when `tiled` is set.
    pub path: String,
    pub colorspace: Colorspace,
    /// Host-specific colorspace name (e.g. "sRGB", "Non-Color"), kept verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colorspace_name: Option<String>,
    #[serde(default)]
    pub tiled: bool,
    /// Tiles present on disk for tiled images (informational).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tiles: Vec<TileIndex>,
}

impl ImageEntry {
    /// Path of the file holding the given tile.
    ///
    /// Single images ignore the tile; tiled images substitute the marker.
    pub fn tile_path(&self, tile: TileIndex) -> String {
        if self.tiled {
            self.path.replace(UDIM_MARKER, &tile.udim().to_string())
        } else {
            self.path.clone()
        }
    }
}

/// A material and its node graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialEntry {
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub links: Vec<LinkSpec>,
}

impl MaterialEntry {
    /// Captures an immutable graph snapshot of this material.
    pub fn graph(&self) -> Result<MaterialGraph, SceneError> {
        MaterialGraph::new(&self.nodes, &self.links).map_err(|source| SceneError::InvalidGraph {
            material: self.name.clone(),
            source,
        })
    }
}

/// A mesh object with one UV coordinate per loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectEntry {
    pub name: String,
    /// `None` when the object has no active UV layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uvs: Option<Vec<[f64; 2]>>,
    #[serde(default)]
    pub materials: Vec<String>,
}

/// The complete host snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub images: Vec<ImageEntry>,
    #[serde(default)]
    pub materials: Vec<MaterialEntry>,
    #[serde(default)]
    pub objects: Vec<ObjectEntry>,
}

impl Scene {
    /// Parses a scene from JSON and validates cross references.
    pub fn from_json(json: &str) -> Result<Self, SceneError> {
        let scene: Scene = serde_json::from_str(json)?;
        scene.validate()?;
        Ok(scene)
    }

    /// Serializes the scene to pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Checks unique names, material references, and UDIM markers.
    pub fn validate(&self) -> Result<(), SceneError> {
        check_unique("image", self.images.iter().map(|i| i.name.as_str()))?;
        check_unique("material", self.materials.iter().map(|m| m.name.as_str()))?;
        check_unique("object", self.objects.iter().map(|o| o.name.as_str()))?;

        for image in &self.images {
            if image.tiled && !image.path.contains(UDIM_MARKER) {
                return Err(SceneError::MissingUdimMarker(image.name.clone()));
            }
        }
        for object in &self.objects {
            for material in &object.materials {
                if self.material(material).is_none() {
                    return Err(SceneError::UnknownMaterial {
                        object: object.name.clone(),
                        material: material.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn image(&self, name: &str) -> Option<&ImageEntry> {
        self.images.iter().find(|i| i.name == name)
    }

    pub fn material(&self, name: &str) -> Option<&MaterialEntry> {
        self.materials.iter().find(|m| m.name == name)
    }

    pub fn material_mut(&mut self, name: &str) -> Option<&mut MaterialEntry> {
        self.materials.iter_mut().find(|m| m.name == name)
    }

    pub fn object(&self, name: &str) -> Option<&ObjectEntry> {
        self.objects.iter().find(|o| o.name == name)
    }

    pub fn object_mut(&mut self, name: &str) -> Option<&mut ObjectEntry> {
        self.objects.iter_mut().find(|o| o.name == name)
    }

    /// Inserts or replaces an image entry by name.
    pub fn upsert_image(&mut self, image: ImageEntry) {
        match self.images.iter_mut().find(|i| i.name == image.name) {
            Some(existing) => *existing = image,
            None => self.images.push(image),
        }
    }
}

/// Resolves a scene-relative path against the scene file's directory.
pub fn resolve_path(base_dir: &Path, path: &str) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

fn check_unique<'a>(
    kind: &'static str,
    names: impl Iterator<Item = &'a str>,
) -> Result<(), SceneError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(SceneError::DuplicateName {
                kind,
                name: name.to_string(),
            });
        }
    }
    Ok(())
}
