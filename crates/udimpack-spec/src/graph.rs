//! Immutable material node-graph snapshots.
//!
//! A [`MaterialGraph`] is captured from a material entry before any analysis
//! runs and is never mutated afterwards. Construction validates that node ids
//! are unique, that every link refers to existing nodes, and that the graph
//! is acyclic.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while building a graph snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("Duplicate node id '{0}'")]
    DuplicateNode(String),

    #[error("Link references unknown node '{0}'")]
    UnknownNode(String),

    #[error("Cycle detected through node '{0}'")]
    Cycle(String),
}

/// What a node does, as far as texture discovery cares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    /// A shader whose linked inputs are texture channels (e.g. `principled_bsdf`).
    Shader { shader: String },
    /// An image texture node; `image` is `None` when no image is assigned.
    ImageTexture {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        image: Option<String>,
    },
    /// The material output node.
    Output,
    /// Any other node (mix, normal map, color ramp, ...). Treated as pass-through.
    Other { node_type: String },
}

/// One node of a material graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: String,
    #[serde(flatten)]
    pub kind: NodeKind,
}

/// A directed link from an output socket to an input socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSpec {
    pub from: String,
    pub from_socket: String,
    pub to: String,
    pub to_socket: String,
}

/// A validated, read-only material graph.
#[derive(Debug, Clone)]
pub struct MaterialGraph {
    nodes: Vec<NodeSpec>,
    index: HashMap<String, usize>,
    /// Links grouped by destination node, in declaration order.
    incoming: BTreeMap<usize, Vec<LinkSpec>>,
    /// Links grouped by source node, in declaration order.
    outgoing: BTreeMap<usize, Vec<LinkSpec>>,
}

impl MaterialGraph {
    /// Builds and validates a snapshot.
    pub fn new(nodes: &[NodeSpec], links: &[LinkSpec]) -> Result<Self, GraphError> {
        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.id.clone(), i).is_some() {
                return Err(GraphError::DuplicateNode(node.id.clone()));
            }
        }

        let mut incoming: BTreeMap<usize, Vec<LinkSpec>> = BTreeMap::new();
        let mut outgoing: BTreeMap<usize, Vec<LinkSpec>> = BTreeMap::new();
        for link in links {
            let from = *index
                .get(&link.from)
                .ok_or_else(|| GraphError::UnknownNode(link.from.clone()))?;
            let to = *index
                .get(&link.to)
                .ok_or_else(|| GraphError::UnknownNode(link.to.clone()))?;
            incoming.entry(to).or_default().push(link.clone());
            outgoing.entry(from).or_default().push(link.clone());
        }

        let graph = Self {
            nodes: nodes.to_vec(),
            index,
            incoming,
            outgoing,
        };
        graph.check_acyclic()?;
        Ok(graph)
    }

    /// All nodes in declaration order.
    pub fn nodes(&self) -> &[NodeSpec] {
        &self.nodes
    }

    /// Kind of the node with the given id.
    pub fn node_kind(&self, id: &str) -> Option<&NodeKind> {
        self.index.get(id).map(|&i| &self.nodes[i].kind)
    }

    /// Links leaving the node, in declaration order.
    pub fn outputs_of(&self, id: &str) -> &[LinkSpec] {
        self.index
            .get(id)
            .and_then(|i| self.outgoing.get(i))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Links entering the node, in declaration order.
    pub fn inputs_of(&self, id: &str) -> &[LinkSpec] {
        self.index
            .get(id)
            .and_then(|i| self.incoming.get(i))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Kahn's algorithm over the outgoing adjacency.
    fn check_acyclic(&self) -> Result<(), GraphError> {
        let mut in_degree = vec![0usize; self.nodes.len()];
        for links in self.incoming.values() {
            for link in links {
                in_degree[self.index[&link.to]] += 1;
            }
        }

        let mut ready: Vec<usize> = (0..self.nodes.len()).filter(|&i| in_degree[i] == 0).collect();
        let mut visited = 0usize;
        while let Some(node) = ready.pop() {
            visited += 1;
            for link in self.outgoing.get(&node).map(Vec::as_slice).unwrap_or(&[]) {
                let to = self.index[&link.to];
                in_degree[to] -= 1;
                if in_degree[to] == 0 {
                    ready.push(to);
                }
            }
        }

        if visited == self.nodes.len() {
            return Ok(());
        }
        let stuck = in_degree
            .iter()
            .position(|&d| d > 0)
            .map(|i| self.nodes[i].id.clone())
            .unwrap_or_default();
        Err(GraphError::Cycle(stuck))
    }
}
