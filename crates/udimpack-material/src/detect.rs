//! Texture channel discovery.
//!
//! Every linked input of a shader node is a root. From each root the graph
//! is walked backwards with an explicit worklist, passing through any
//! non-shader node, and every distinct image found is recorded. The first
//! image under a socket takes that socket's channel; images blended in
//! alongside it (an AO map multiplied into base color, say) become custom
//! channels named after the image. Names never decide a well-known channel.

use std::collections::HashSet;

use tracing::{debug, info, warn};
use udimpack_spec::{
    custom_name_from_image, ChannelKind, ChannelRecord, ImageEntry, LinkSpec, MaterialEntry,
    MaterialGraph, NodeKind, WellKnownChannel,
};

use crate::error::{MaterialError, MaterialResult};

/// Custom channel name used when an image name yields nothing usable.
const FALLBACK_CUSTOM_NAME: &str = "Texture";

/// Channels discovered in one material.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedChannels {
    pub material: String,
    /// One record per channel; channel names are unique.
    pub records: Vec<ChannelRecord>,
    /// Image nodes that were skipped.
    pub issues: Vec<MaterialError>,
}

impl DetectedChannels {
    pub fn record(&self, channel: &ChannelKind) -> Option<&ChannelRecord> {
        self.records.iter().find(|r| &r.channel == channel)
    }

    /// Record bound to the given image, if any.
    pub fn record_for_image(&self, image: &str) -> Option<&ChannelRecord> {
        self.records.iter().find(|r| r.image == image)
    }

    /// Records whose image colorspace differs from what the channel usually uses.
    pub fn colorspace_mismatches(&self) -> impl Iterator<Item = &ChannelRecord> {
        self.records.iter().filter(|r| {
            r.channel
                .expected_colorspace()
                .is_some_and(|expected| expected != r.colorspace)
        })
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Captures the material's graph and detects its channels.
pub fn detect_material(
    material: &MaterialEntry,
    images: &[ImageEntry],
) -> MaterialResult<DetectedChannels> {
    let graph = MaterialGraph::new(&material.nodes, &material.links).map_err(|source| {
        MaterialError::InvalidGraph {
            material: material.name.clone(),
            source,
        }
    })?;
    Ok(detect_channels(&material.name, &graph, images))
}

/// Detects the channels of a captured graph.
///
/// A material without textures yields an empty set.
pub fn detect_channels(
    material: &str,
    graph: &MaterialGraph,
    images: &[ImageEntry],
) -> DetectedChannels {
    let mut issues = Vec::new();
    let mut reported_nodes = HashSet::new();

    let mut per_root: Vec<(ChannelKind, Vec<(&str, &ImageEntry)>)> = Vec::new();
    for (channel, link) in shader_roots(graph) {
        let mut found = Vec::new();
        for (node, image) in upstream_images(graph, &link.from) {
            match images.iter().find(|i| i.name == image) {
                Some(entry) => found.push((node, entry)),
                None => {
                    if reported_nodes.insert(node) {
                        warn!(material, node, image, "Image node references unknown image");
                        issues.push(MaterialError::UnknownImage {
                            material: material.to_string(),
                            node: node.to_string(),
                            image: image.to_string(),
                        });
                    }
                }
            }
        }
        per_root.push((channel, found));
    }

    let mut records: Vec<ChannelRecord> = Vec::new();
    let mut taken: HashSet<ChannelKind> = HashSet::new();
    let mut seen_images: HashSet<&str> = HashSet::new();

    // First unclaimed image under each socket takes the socket's channel.
    for (channel, found) in &per_root {
        if taken.contains(channel) {
            continue;
        }
        let first = found
            .iter()
            .find(|(_, entry)| !seen_images.contains(entry.name.as_str()));
        if let Some(&(node, entry)) = first {
            seen_images.insert(entry.name.as_str());
            taken.insert(channel.clone());
            records.push(make_record(material, channel.clone(), node, entry));
        }
    }

    // Everything else becomes a custom channel.
    for (_, found) in &per_root {
        for &(node, entry) in found {
            if !seen_images.insert(entry.name.as_str()) {
                continue;
            }
            let channel = unique_custom_channel(&custom_name_from_image(&entry.name), &taken);
            taken.insert(channel.clone());
            records.push(make_record(material, channel, node, entry));
        }
    }

    info!(
        material,
        channels = records.len(),
        "Detected texture channels"
    );
    DetectedChannels {
        material: material.to_string(),
        records,
        issues,
    }
}

/// Linked shader inputs, well-known channels first in table order, then
/// other sockets in declaration order.
fn shader_roots(graph: &MaterialGraph) -> Vec<(ChannelKind, &LinkSpec)> {
    let mut roots: Vec<(ChannelKind, &LinkSpec)> = graph
        .nodes()
        .iter()
        .filter(|node| matches!(node.kind, NodeKind::Shader { .. }))
        .flat_map(|node| graph.inputs_of(&node.id))
        .map(|link| (ChannelKind::from_name(&link.to_socket), link))
        .collect();
    roots.sort_by_key(|(channel, _)| match channel {
        ChannelKind::WellKnown(kind) => *kind as usize,
        ChannelKind::Custom(_) => usize::MAX,
    });
    roots
}

/// Image nodes reachable backwards from `start`, in depth-first order.
///
/// Passes through `Other` nodes only; shaders, outputs and image nodes end
/// a branch.
fn upstream_images<'g>(graph: &'g MaterialGraph, start: &'g str) -> Vec<(&'g str, &'g str)> {
    let mut found = Vec::new();
    let mut visited = HashSet::new();
    let mut stack = vec![start];

    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        match graph.node_kind(id) {
            Some(NodeKind::ImageTexture { image: Some(image) }) => found.push((id, image.as_str())),
            Some(NodeKind::Other { .. }) => {
                // Reversed so inputs pop in declaration order.
                for link in graph.inputs_of(id).iter().rev() {
                    stack.push(link.from.as_str());
                }
            }
            _ => {}
        }
    }
    found
}

/// Custom channel for a blended image.
///
/// Always custom: a name that collides with a shader socket or a channel
/// already taken gets a numeric suffix.
fn unique_custom_channel(base: &str, taken: &HashSet<ChannelKind>) -> ChannelKind {
    let base = if base.is_empty() {
        FALLBACK_CUSTOM_NAME
    } else {
        base
    };
    let is_free = |name: &str| {
        WellKnownChannel::from_socket(name).is_none()
            && !taken.contains(&ChannelKind::Custom(name.to_string()))
    };
    if is_free(base) {
        return ChannelKind::Custom(base.to_string());
    }
    let mut n = 2;
    loop {
        let candidate = format!("{} {}", base, n);
        if is_free(&candidate) {
            return ChannelKind::Custom(candidate);
        }
        n += 1;
    }
}

fn make_record(material: &str, channel: ChannelKind, node: &str, image: &ImageEntry) -> ChannelRecord {
    if let Some(expected) = channel.expected_colorspace() {
        if expected != image.colorspace {
            warn!(
                material,
                channel = %channel,
                image = %image.name,
                declared = %image.colorspace,
                expected = %expected,
                "Image colorspace differs from the channel's usual encoding; keeping declared tag"
            );
        }
    }
    debug!(material, channel = %channel, image = %image.name, node, "Channel record");
    ChannelRecord {
        channel,
        image: image.name.clone(),
        colorspace: image.colorspace,
        node: node.to_string(),
    }
}
