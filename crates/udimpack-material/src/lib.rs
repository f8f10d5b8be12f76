//! udimpack material stage
//!
//! Finds the texture channels of each material and, once the composited
//! images exist, points the materials at them.
//!
//! - [`detect`]: structural channel discovery over an immutable graph snapshot
//! - [`rewrite`]: in-place rebinding, or one shared material for merged objects
//!
//! # Example
//!
//! ```
//! use udimpack_material::detect_material;
//! use udimpack_spec::Scene;
//!
//! let scene = Scene::from_json(r#"{
//!     "images": [{"name": "wood", "path": "wood.<UDIM>.png", "colorspace": "color", "tiled": true}],
//!     "materials": [{
//!         "name": "Wood",
//!         "nodes": [
//!             {"id": "bsdf", "type": "shader", "shader": "principled_bsdf"},
//!             {"id": "tex", "type": "image_texture", "image": "wood"}
//!         ],
//!         "links": [{"from": "tex", "from_socket": "Color", "to": "bsdf", "to_socket": "Base Color"}]
//!     }]
//! }"#).unwrap();
//!
//! let detected = detect_material(&scene.materials[0], &scene.images).unwrap();
//! assert_eq!(detected.records[0].channel.name(), "Base Color");
//! ```

pub mod detect;
pub mod error;
pub mod rewrite;

pub use detect::{detect_channels, detect_material, DetectedChannels};
pub use error::{MaterialError, MaterialResult};
pub use rewrite::{
    build_shared_material, rebind_materials, shared_material_name, BindingMap, ChannelBinding,
    ObjectMerger, Rebinding, RewriteOutcome, SharedMaterial,
};
