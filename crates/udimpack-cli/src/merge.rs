//! Object merging for the scene file host.

use tracing::info;
use udimpack_material::{MaterialError, MaterialResult, ObjectMerger};
use udimpack_spec::Scene;

/// Joins objects into the first one: UVs are concatenated in order and the
/// material lists are unioned. The other objects are removed from the scene.
#[derive(Debug, Default)]
pub struct UvConcatMerger;

impl ObjectMerger for UvConcatMerger {
    fn merge(&mut self, scene: &mut Scene, objects: &[String]) -> MaterialResult<String> {
        let Some(target) = objects.first() else {
            return Err(MaterialError::MergeFailed {
                reason: "no objects to merge".to_string(),
            });
        };
        if let Some(missing) = objects.iter().find(|name| scene.object(name).is_none()) {
            return Err(MaterialError::MergeFailed {
                reason: format!("object '{}' is not in the scene", missing),
            });
        }

        let mut uvs: Vec<[f64; 2]> = Vec::new();
        let mut any_uvs = false;
        let mut materials: Vec<String> = Vec::new();
        for name in objects {
            if let Some(object) = scene.object(name) {
                if let Some(object_uvs) = &object.uvs {
                    any_uvs = true;
                    uvs.extend_from_slice(object_uvs);
                }
                for material in &object.materials {
                    if !materials.contains(material) {
                        materials.push(material.clone());
                    }
                }
            }
        }

        scene
            .objects
            .retain(|o| o.name == *target || !objects.contains(&o.name));
        if let Some(merged) = scene.object_mut(target) {
            merged.uvs = any_uvs.then_some(uvs);
            merged.materials = materials;
        }

        info!(object = %target, merged = objects.len(), "Merged objects");
        Ok(target.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use udimpack_spec::ObjectEntry;

    fn object(name: &str, uvs: Vec<[f64; 2]>, materials: &[&str]) -> ObjectEntry {
        ObjectEntry {
            name: name.into(),
            uvs: Some(uvs),
            materials: materials.iter().map(|m| m.to_string()).collect(),
        }
    }

    #[test]
    fn test_merge_concatenates() {
        let mut scene = Scene {
            objects: vec![
                object("a", vec![[0.1, 0.1]], &["M1"]),
                object("other", vec![[5.0, 5.0]], &["M3"]),
                object("b", vec![[0.2, 0.2], [0.3, 0.3]], &["M2", "M1"]),
            ],
            ..Scene::default()
        };
        let merged = UvConcatMerger
            .merge(&mut scene, &["a".to_string(), "b".to_string()])
            .unwrap();

        assert_eq!(merged, "a");
        assert_eq!(scene.objects.len(), 2);
        let a = scene.object("a").unwrap();
        assert_eq!(a.uvs.as_ref().unwrap().len(), 3);
        assert_eq!(a.materials, vec!["M1", "M2"]);
        assert!(scene.object("other").is_some());
    }

    #[test]
    fn test_merge_unknown_object() {
        let mut scene = Scene::default();
        let err = UvConcatMerger
            .merge(&mut scene, &["ghost".to_string()])
            .unwrap_err();
        assert!(matches!(err, MaterialError::MergeFailed { .. }));
    }
}
