//! Material rebinding.
//!
//! Two modes:
//!
//! - [`rebind_materials`] updates each material in place, pointing every image
//!   node of a detected channel at the composited tiled image.
//! - [`build_shared_material`] merges the objects through an [`ObjectMerger`]
//!   and gives the merged object one shared material built from the first
//!   textured material.
//!
//! Only image references change; nodes, links and every other setting are
//! left as they were. A channel without composited images keeps its original
//! binding.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};
use udimpack_spec::naming::image_entry_name;
use udimpack_spec::{
    ChannelKind, ChannelRecord, Colorspace, ImageEntry, LinkSpec, MaterialEntry, NodeKind,
    NodeSpec, Scene, TileIndex,
};

use crate::detect::DetectedChannels;
use crate::error::{MaterialError, MaterialResult};

/// Composited images of one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelBinding {
    pub channel: ChannelKind,
    /// Tiled image path containing the UDIM marker.
    pub path: String,
    /// Colorspace of the channel's first record; other tags get their own entry.
    pub colorspace: Colorspace,
    /// Destination tiles written for the channel.
    pub tiles: Vec<TileIndex>,
}

/// Bindings by channel.
pub type BindingMap = BTreeMap<ChannelKind, ChannelBinding>;

/// One image node pointed at a new image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rebinding {
    pub material: String,
    pub node: String,
    pub channel: ChannelKind,
    pub from_image: String,
    pub to_image: String,
}

/// What a rewrite changed, and what it had to leave alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RewriteOutcome {
    pub rebound: Vec<Rebinding>,
    pub issues: Vec<MaterialError>,
}

/// Host operation that merges objects into one mesh.
pub trait ObjectMerger {
    /// Merges `objects` and returns the name of the resulting object.
    fn merge(&mut self, scene: &mut Scene, objects: &[String]) -> MaterialResult<String>;
}

/// Result of building the shared material.
#[derive(Debug, Clone, PartialEq)]
pub struct SharedMaterial {
    /// Name of the new material.
    pub material: String,
    /// Object now carrying it.
    pub object: String,
    pub outcome: RewriteOutcome,
}

/// Name of the material created by [`build_shared_material`].
pub fn shared_material_name(set_name: &str) -> String {
    format!("{}_Material", set_name)
}

/// Rebinds the detected channels of each material in place.
pub fn rebind_materials(
    scene: &mut Scene,
    detected: &[DetectedChannels],
    set_name: &str,
    bindings: &BindingMap,
) -> RewriteOutcome {
    let mut outcome = RewriteOutcome::default();

    for channels in detected {
        if scene.material(&channels.material).is_none() {
            outcome.issues.push(MaterialError::UnknownMaterial {
                material: channels.material.clone(),
            });
            continue;
        }
        for record in &channels.records {
            let Some(binding) = bindings.get(&record.channel) else {
                warn!(
                    material = %channels.material,
                    channel = %record.channel,
                    "No destination images; keeping original binding"
                );
                outcome.issues.push(MaterialError::MissingDestination {
                    material: channels.material.clone(),
                    channel: record.channel.clone(),
                });
                continue;
            };
            let entry = ensure_image_entry(scene, set_name, binding, record);
            if let Some(material) = scene.material_mut(&channels.material) {
                rebind_nodes(material, record, &entry, &mut outcome.rebound);
            }
        }
    }

    info!(
        materials = detected.len(),
        rebound = outcome.rebound.len(),
        kept = outcome.issues.len(),
        "Rebound materials"
    );
    outcome
}

/// Merges `objects` and assigns them one shared material.
///
/// The shared material is a copy of the first material with detected
/// channels, named [`shared_material_name`]. Each of its image nodes whose
/// image was detected in any material is bound to that channel's composited
/// image. A bound channel the copy has no node for is grafted in from the
/// first material that has it: the chain feeding the shader socket is copied
/// over with its images rebound. When the socket is already taken in the
/// copy, the image node is added unlinked and the channel is reported as
/// [`MaterialError::UnwiredChannel`]. The original materials stay in the
/// scene untouched.
pub fn build_shared_material(
    scene: &mut Scene,
    detected: &[DetectedChannels],
    set_name: &str,
    bindings: &BindingMap,
    objects: &[String],
    merger: &mut dyn ObjectMerger,
) -> MaterialResult<SharedMaterial> {
    let source = detected
        .iter()
        .find(|d| !d.is_empty())
        .ok_or(MaterialError::NoSourceMaterial)?;
    let template = scene
        .material(&source.material)
        .cloned()
        .ok_or_else(|| MaterialError::UnknownMaterial {
            material: source.material.clone(),
        })?;

    let merged = merger.merge(scene, objects)?;
    if scene.object(&merged).is_none() {
        return Err(MaterialError::MergeFailed {
            reason: format!("merged object '{}' is not in the scene", merged),
        });
    }

    let name = shared_material_name(set_name);
    let mut shared = MaterialEntry {
        name: name.clone(),
        ..template
    };

    let mut outcome = RewriteOutcome::default();
    let image_nodes: Vec<(String, String)> = shared
        .nodes
        .iter()
        .filter_map(|node| match &node.kind {
            NodeKind::ImageTexture { image: Some(image) } => Some((node.id.clone(), image.clone())),
            _ => None,
        })
        .collect();
    for (node, image) in image_nodes {
        let Some(record) = detected.iter().find_map(|d| d.record_for_image(&image)) else {
            continue;
        };
        match bindings.get(&record.channel) {
            Some(binding) => {
                let entry = ensure_image_entry(scene, set_name, binding, record);
                set_node_image(&mut shared, &node, &entry);
                outcome.rebound.push(Rebinding {
                    material: name.clone(),
                    node,
                    channel: record.channel.clone(),
                    from_image: image,
                    to_image: entry,
                });
            }
            None => outcome.issues.push(MaterialError::MissingDestination {
                material: name.clone(),
                channel: record.channel.clone(),
            }),
        }
    }

    for (channel, binding) in bindings {
        if outcome.rebound.iter().any(|r| &r.channel == channel) {
            continue;
        }
        let Some((source_name, record)) = detected
            .iter()
            .find_map(|d| d.record(channel).map(|r| (d.material.clone(), r.clone())))
        else {
            continue;
        };
        let Some(source_material) = scene.material(&source_name).cloned() else {
            continue;
        };
        graft_channel(
            scene,
            &mut shared,
            &source_material,
            &record,
            detected,
            set_name,
            bindings,
            binding,
            &mut outcome,
        );
    }

    match scene.material_mut(&name) {
        Some(existing) => *existing = shared,
        None => scene.materials.push(shared),
    }
    if let Some(object) = scene.object_mut(&merged) {
        object.materials = vec![name.clone()];
    }

    info!(
        material = %name,
        object = %merged,
        rebound = outcome.rebound.len(),
        "Built shared material"
    );
    Ok(SharedMaterial {
        material: name,
        object: merged,
        outcome,
    })
}

/// Copies the chain that feeds `record`'s shader socket in `source` into
/// `shared`, rebinding every detected image inside it.
#[allow(clippy::too_many_arguments)]
fn graft_channel(
    scene: &mut Scene,
    shared: &mut MaterialEntry,
    source: &MaterialEntry,
    record: &ChannelRecord,
    detected: &[DetectedChannels],
    set_name: &str,
    bindings: &BindingMap,
    binding: &ChannelBinding,
    outcome: &mut RewriteOutcome,
) {
    let shader = shared
        .nodes
        .iter()
        .find(|n| matches!(n.kind, NodeKind::Shader { .. }))
        .map(|n| n.id.clone());
    let root = feeding_link(source, &record.node);

    let wired = match (&shader, root) {
        (Some(shader), Some((root, chain)))
            if !shared
                .links
                .iter()
                .any(|l| &l.to == shader && l.to_socket == root.to_socket) =>
        {
            let id_of = |id: &str| unique_node_id(shared, &format!("{}.{}", source.name, id));
            let ids: BTreeMap<String, String> =
                chain.iter().map(|id| (id.clone(), id_of(id))).collect();

            for node in source.nodes.iter().filter(|n| ids.contains_key(&n.id)) {
                let mut copy = node.clone();
                copy.id = ids[&node.id].clone();
                if let NodeKind::ImageTexture { image: Some(image) } = &node.kind {
                    let rebind = detected
                        .iter()
                        .find(|d| d.material == source.name)
                        .and_then(|d| d.record_for_image(image))
                        .and_then(|r| bindings.get(&r.channel).map(|b| (r, b)));
                    if let Some((image_record, image_binding)) = rebind {
                        let entry = ensure_image_entry(scene, set_name, image_binding, image_record);
                        copy.kind = NodeKind::ImageTexture {
                            image: Some(entry.clone()),
                        };
                        outcome.rebound.push(Rebinding {
                            material: shared.name.clone(),
                            node: copy.id.clone(),
                            channel: image_record.channel.clone(),
                            from_image: image.clone(),
                            to_image: entry,
                        });
                    }
                }
                shared.nodes.push(copy);
            }
            for link in source
                .links
                .iter()
                .filter(|l| ids.contains_key(&l.from) && ids.contains_key(&l.to))
            {
                shared.links.push(LinkSpec {
                    from: ids[&link.from].clone(),
                    to: ids[&link.to].clone(),
                    ..link.clone()
                });
            }
            shared.links.push(LinkSpec {
                from: ids[&root.from].clone(),
                from_socket: root.from_socket.clone(),
                to: shader.clone(),
                to_socket: root.to_socket.clone(),
            });
            debug!(
                material = %shared.name,
                channel = %record.channel,
                from = %source.name,
                nodes = ids.len(),
                "Grafted channel chain"
            );
            true
        }
        _ => false,
    };

    if !wired {
        let entry = ensure_image_entry(scene, set_name, binding, record);
        let id = unique_node_id(shared, &format!("{}.{}", source.name, record.node));
        shared.nodes.push(NodeSpec {
            id: id.clone(),
            kind: NodeKind::ImageTexture {
                image: Some(entry.clone()),
            },
        });
        warn!(
            material = %shared.name,
            channel = %record.channel,
            "Shader socket already linked; added image node unlinked"
        );
        outcome.rebound.push(Rebinding {
            material: shared.name.clone(),
            node: id,
            channel: record.channel.clone(),
            from_image: record.image.clone(),
            to_image: entry,
        });
        outcome.issues.push(MaterialError::UnwiredChannel {
            material: shared.name.clone(),
            channel: record.channel.clone(),
        });
    }
}

/// The shader input link whose upstream chain contains `node`, and the ids
/// of that chain (pass-through and image nodes) in declaration order.
fn feeding_link(material: &MaterialEntry, node: &str) -> Option<(LinkSpec, Vec<String>)> {
    let is_shader = |id: &str| {
        material
            .nodes
            .iter()
            .any(|n| n.id == id && matches!(n.kind, NodeKind::Shader { .. }))
    };
    let kind_of = |id: &str| material.nodes.iter().find(|n| n.id == id).map(|n| &n.kind);

    for root in material.links.iter().filter(|l| is_shader(&l.to)) {
        let mut chain: Vec<&str> = Vec::new();
        let mut stack = vec![root.from.as_str()];
        while let Some(id) = stack.pop() {
            if chain.contains(&id) {
                continue;
            }
            match kind_of(id) {
                Some(NodeKind::ImageTexture { .. }) => chain.push(id),
                Some(NodeKind::Other { .. }) => {
                    chain.push(id);
                    stack.extend(
                        material
                            .links
                            .iter()
                            .filter(|l| l.to == id)
                            .map(|l| l.from.as_str()),
                    );
                }
                _ => {}
            }
        }
        if chain.contains(&node) {
            let ordered = material
                .nodes
                .iter()
                .filter(|n| chain.contains(&n.id.as_str()))
                .map(|n| n.id.clone())
                .collect();
            return Some((root.clone(), ordered));
        }
    }
    None
}

fn unique_node_id(material: &MaterialEntry, base: &str) -> String {
    let taken = |id: &str| material.nodes.iter().any(|n| n.id == id);
    if !taken(base) {
        return base.to_string();
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}.{}", base, n);
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Adds (once) the tiled image entry a record should be bound to and returns its name.
///
/// Records tagged like the binding share `<set>_<Channel>`; other tags get
/// `<set>_<Channel>_<tag>` so each binding keeps its record's colorspace.
fn ensure_image_entry(
    scene: &mut Scene,
    set_name: &str,
    binding: &ChannelBinding,
    record: &ChannelRecord,
) -> String {
    let base = image_entry_name(set_name, &binding.channel);
    let name = if record.colorspace == binding.colorspace {
        base
    } else {
        format!("{}_{}", base, record.colorspace.as_str())
    };
    if scene.image(&name).is_none() {
        let colorspace_name = scene
            .image(&record.image)
            .and_then(|source| source.colorspace_name.clone());
        debug!(image = %name, path = %binding.path, colorspace = %record.colorspace, "Adding tiled image");
        scene.images.push(ImageEntry {
            name: name.clone(),
            path: binding.path.clone(),
            colorspace: record.colorspace,
            colorspace_name,
            tiled: true,
            tiles: binding.tiles.clone(),
        });
    }
    name
}

fn rebind_nodes(
    material: &mut MaterialEntry,
    record: &ChannelRecord,
    entry: &str,
    rebound: &mut Vec<Rebinding>,
) {
    for node in &mut material.nodes {
        if let NodeKind::ImageTexture { image: Some(image) } = &mut node.kind {
            if *image == record.image {
                rebound.push(Rebinding {
                    material: material.name.clone(),
                    node: node.id.clone(),
                    channel: record.channel.clone(),
                    from_image: std::mem::replace(image, entry.to_string()),
                    to_image: entry.to_string(),
                });
            }
        }
    }
}

fn set_node_image(material: &mut MaterialEntry, node_id: &str, entry: &str) {
    if let Some(node) = material.nodes.iter_mut().find(|n| n.id == node_id) {
        if let NodeKind::ImageTexture { image } = &mut node.kind {
            *image = Some(entry.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::detect_material;
    use pretty_assertions::assert_eq;

    const SCENE: &str = r#"{
        "images": [
            {"name": "albedo_a", "path": "a_col.<UDIM>.png", "colorspace": "color", "colorspace_name": "sRGB", "tiled": true},
            {"name": "rough_a", "path": "a_rough.<UDIM>.png", "colorspace": "non_color", "tiled": true},
            {"name": "albedo_b", "path": "b_col.<UDIM>.png", "colorspace": "non_color", "tiled": true}
        ],
        "materials": [
            {
                "name": "A",
                "nodes": [
                    {"id": "bsdf", "type": "shader", "shader": "principled_bsdf"},
                    {"id": "col", "type": "image_texture", "image": "albedo_a"},
                    {"id": "rough", "type": "image_texture", "image": "rough_a"},
                    {"id": "out", "type": "output"}
                ],
                "links": [
                    {"from": "col", "from_socket": "Color", "to": "bsdf", "to_socket": "Base Color"},
                    {"from": "rough", "from_socket": "Color", "to": "bsdf", "to_socket": "Roughness"},
                    {"from": "bsdf", "from_socket": "BSDF", "to": "out", "to_socket": "Surface"}
                ]
            },
            {
                "name": "B",
                "nodes": [
                    {"id": "bsdf", "type": "shader", "shader": "principled_bsdf"},
                    {"id": "col", "type": "image_texture", "image": "albedo_b"}
                ],
                "links": [
                    {"from": "col", "from_socket": "Color", "to": "bsdf", "to_socket": "Base Color"}
                ]
            }
        ],
        "objects": [
            {"name": "a", "uvs": [[0.5, 0.5]], "materials": ["A"]},
            {"name": "b", "uvs": [[1.5, 0.5]], "materials": ["B"]}
        ]
    }"#;

    fn setup() -> (Scene, Vec<DetectedChannels>) {
        let scene = Scene::from_json(SCENE).unwrap();
        let detected = scene
            .materials
            .iter()
            .map(|m| detect_material(m, &scene.images).unwrap())
            .collect();
        (scene, detected)
    }

    fn binding(name: &str, colorspace: Colorspace) -> (ChannelKind, ChannelBinding) {
        let channel = ChannelKind::from_name(name);
        let binding = ChannelBinding {
            channel: channel.clone(),
            path: format!("/out/Set_1_{}.<UDIM>.png", channel.file_token()),
            colorspace,
            tiles: vec![TileIndex::BASE],
        };
        (channel, binding)
    }

    fn image_of<'a>(scene: &'a Scene, material: &str, node: &str) -> &'a str {
        let material = scene.material(material).unwrap();
        match &material.nodes.iter().find(|n| n.id == node).unwrap().kind {
            NodeKind::ImageTexture { image: Some(image) } => image,
            other => panic!("not an image node: {other:?}"),
        }
    }

    #[test]
    fn test_mode_a_rebinds_and_keeps_structure() {
        let (mut scene, detected) = setup();
        let before = scene.material("A").unwrap().clone();
        let bindings = BindingMap::from([
            binding("Base Color", Colorspace::Color),
            binding("Roughness", Colorspace::NonColor),
        ]);

        let outcome = rebind_materials(&mut scene, &detected, "Set", &bindings);
        assert!(outcome.issues.is_empty());
        assert_eq!(outcome.rebound.len(), 3);

        assert_eq!(image_of(&scene, "A", "col"), "Set_Base_Color");
        assert_eq!(image_of(&scene, "A", "rough"), "Set_Roughness");
        let after = scene.material("A").unwrap();
        assert_eq!(after.links, before.links);
        assert_eq!(after.nodes.len(), before.nodes.len());

        let entry = scene.image("Set_Base_Color").unwrap();
        assert!(entry.tiled);
        assert_eq!(entry.colorspace, Colorspace::Color);
        assert_eq!(entry.colorspace_name.as_deref(), Some("sRGB"));
    }

    #[test]
    fn test_differing_tag_gets_own_entry() {
        let (mut scene, detected) = setup();
        let bindings = BindingMap::from([binding("Base Color", Colorspace::Color)]);
        rebind_materials(&mut scene, &detected, "Set", &bindings);

        assert_eq!(image_of(&scene, "B", "col"), "Set_Base_Color_non_color");
        let entry = scene.image("Set_Base_Color_non_color").unwrap();
        assert_eq!(entry.colorspace, Colorspace::NonColor);
        assert_eq!(entry.path, scene.image("Set_Base_Color").unwrap().path);
    }

    #[test]
    fn test_missing_destination_keeps_binding() {
        let (mut scene, detected) = setup();
        let bindings = BindingMap::from([binding("Base Color", Colorspace::Color)]);
        let outcome = rebind_materials(&mut scene, &detected, "Set", &bindings);

        assert_eq!(image_of(&scene, "A", "rough"), "rough_a");
        assert_eq!(outcome.issues.len(), 1);
        assert!(matches!(
            &outcome.issues[0],
            MaterialError::MissingDestination { channel, .. } if channel.name() == "Roughness"
        ));
    }

    struct KeepFirst;

    impl ObjectMerger for KeepFirst {
        fn merge(&mut self, scene: &mut Scene, objects: &[String]) -> MaterialResult<String> {
            let first = objects.first().cloned().ok_or(MaterialError::MergeFailed {
                reason: "nothing to merge".into(),
            })?;
            scene.objects.retain(|o| o.name == first || !objects.contains(&o.name));
            Ok(first)
        }
    }

    #[test]
    fn test_mode_b_shared_material() {
        let (mut scene, detected) = setup();
        let bindings = BindingMap::from([
            binding("Base Color", Colorspace::Color),
            binding("Roughness", Colorspace::NonColor),
        ]);
        let objects = vec!["a".to_string(), "b".to_string()];

        let shared =
            build_shared_material(&mut scene, &detected, "Set", &bindings, &objects, &mut KeepFirst)
                .unwrap();

        assert_eq!(shared.material, "Set_Material");
        assert_eq!(shared.object, "a");
        assert_eq!(scene.objects.len(), 1);
        assert_eq!(scene.object("a").unwrap().materials, vec!["Set_Material"]);
        assert_eq!(image_of(&scene, "Set_Material", "col"), "Set_Base_Color");
        assert_eq!(image_of(&scene, "Set_Material", "rough"), "Set_Roughness");
        // Originals untouched.
        assert_eq!(image_of(&scene, "A", "col"), "albedo_a");
    }

    fn roughness_and_base_color() -> BindingMap {
        BindingMap::from([
            binding("Base Color", Colorspace::Color),
            binding("Roughness", Colorspace::NonColor),
        ])
    }

    #[test]
    fn test_mode_b_grafts_channel_missing_from_template() {
        let (mut scene, mut detected) = setup();
        // B (base color only) becomes the template.
        detected.reverse();
        let objects = vec!["b".to_string(), "a".to_string()];

        let shared = build_shared_material(
            &mut scene,
            &detected,
            "Set",
            &roughness_and_base_color(),
            &objects,
            &mut KeepFirst,
        )
        .unwrap();

        assert!(shared.outcome.issues.is_empty());
        assert_eq!(image_of(&scene, "Set_Material", "col"), "Set_Base_Color_non_color");
        assert_eq!(image_of(&scene, "Set_Material", "A.rough"), "Set_Roughness");

        let material = scene.material("Set_Material").unwrap();
        assert!(material.links.contains(&LinkSpec {
            from: "A.rough".into(),
            from_socket: "Color".into(),
            to: "bsdf".into(),
            to_socket: "Roughness".into(),
        }));
        assert!(shared
            .outcome
            .rebound
            .iter()
            .any(|r| r.channel.name() == "Roughness" && r.from_image == "rough_a"));
        // Still a valid graph.
        assert!(detect_material(material, &scene.images).is_ok());
        assert_eq!(image_of(&scene, "A", "rough"), "rough_a");
    }

    #[test]
    fn test_mode_b_reports_channel_it_cannot_wire() {
        let (mut scene, _) = setup();
        let b = scene.material_mut("B").unwrap();
        b.nodes.push(NodeSpec {
            id: "value".into(),
            kind: NodeKind::Other {
                node_type: "value".into(),
            },
        });
        b.links.push(LinkSpec {
            from: "value".into(),
            from_socket: "Value".into(),
            to: "bsdf".into(),
            to_socket: "Roughness".into(),
        });
        let mut detected: Vec<DetectedChannels> = scene
            .materials
            .iter()
            .map(|m| detect_material(m, &scene.images).unwrap())
            .collect();
        detected.reverse();

        let shared = build_shared_material(
            &mut scene,
            &detected,
            "Set",
            &roughness_and_base_color(),
            &["b".to_string(), "a".to_string()],
            &mut KeepFirst,
        )
        .unwrap();

        assert_eq!(
            shared.outcome.issues,
            vec![MaterialError::UnwiredChannel {
                material: "Set_Material".into(),
                channel: ChannelKind::from_name("Roughness"),
            }]
        );
        // The destination is bound, just not linked.
        assert_eq!(image_of(&scene, "Set_Material", "A.rough"), "Set_Roughness");
        let material = scene.material("Set_Material").unwrap();
        assert!(!material.links.iter().any(|l| l.from == "A.rough"));
    }

    #[test]
    fn test_mode_b_without_textures() {
        let mut scene = Scene::default();
        let err = build_shared_material(
            &mut scene,
            &[],
            "Set",
            &BindingMap::new(),
            &["a".to_string()],
            &mut KeepFirst,
        )
        .unwrap_err();
        assert_eq!(err, MaterialError::NoSourceMaterial);
    }
}
