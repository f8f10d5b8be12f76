//! Error types for the material stage.

use thiserror::Error;
use udimpack_spec::{BackendError, ChannelKind, GraphError};

/// Result type for material operations.
pub type MaterialResult<T> = Result<T, MaterialError>;

/// Errors raised while detecting channels or rewriting materials.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MaterialError {
    /// The node graph could not be captured.
    #[error("Material '{material}' has an invalid node graph: {source}")]
    InvalidGraph {
        material: String,
        #[source]
        source: GraphError,
    },

    /// An image node names an image the scene does not contain.
    #[error("Material '{material}': node '{node}' references unknown image '{image}'")]
    UnknownImage {
        material: String,
        node: String,
        image: String,
    },

    /// A material to rewrite is not in the scene.
    #[error("Material '{material}' not found in scene")]
    UnknownMaterial { material: String },

    /// A channel has no composited images, so its binding was left alone.
    #[error("Material '{material}': channel '{channel}' has no destination images, keeping original binding")]
    MissingDestination {
        material: String,
        channel: ChannelKind,
    },

    /// The shared material got the channel's image node, but the shader
    /// socket it fed was already linked.
    #[error("Material '{material}': channel '{channel}' bound to an unlinked image node, shader socket already in use")]
    UnwiredChannel {
        material: String,
        channel: ChannelKind,
    },

    /// No detected material to base the shared material on.
    #[error("No source material available to build the shared material")]
    NoSourceMaterial,

    /// The host could not merge the objects.
    #[error("Failed to merge objects: {reason}")]
    MergeFailed { reason: String },
}

impl MaterialError {
    /// Material the error is attached to, if any.
    pub fn material(&self) -> Option<&str> {
        match self {
            MaterialError::InvalidGraph { material, .. }
            | MaterialError::UnknownImage { material, .. }
            | MaterialError::UnknownMaterial { material }
            | MaterialError::MissingDestination { material, .. }
            | MaterialError::UnwiredChannel { material, .. } => Some(material),
            MaterialError::NoSourceMaterial | MaterialError::MergeFailed { .. } => None,
        }
    }
}

impl BackendError for MaterialError {
    fn code(&self) -> &'static str {
        match self {
            MaterialError::InvalidGraph { .. } => "MATERIAL_001",
            MaterialError::UnknownImage { .. } => "MATERIAL_002",
            MaterialError::UnknownMaterial { .. } => "MATERIAL_003",
            MaterialError::MissingDestination { .. } => "MATERIAL_004",
            MaterialError::NoSourceMaterial => "MATERIAL_005",
            MaterialError::MergeFailed { .. } => "MATERIAL_006",
            MaterialError::UnwiredChannel { .. } => "MATERIAL_007",
        }
    }

    fn category(&self) -> &'static str {
        "material"
    }
}
