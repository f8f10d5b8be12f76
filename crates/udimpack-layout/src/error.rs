//! Error types for the layout stage.

use thiserror::Error;
use udimpack_spec::{BackendError, TileError, TileIndex};

/// Result type for layout operations.
pub type LayoutResult<T> = Result<T, LayoutError>;

/// Errors that can occur while locating, planning or remapping.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    /// Object has no active UV layer.
    #[error("Object '{object}' has no UV data")]
    MissingUvs { object: String },

    /// Object has a UV layer without any coordinates.
    #[error("Object '{object}' has an empty UV layer")]
    EmptyUvs { object: String },

    /// Bounding-box center does not fall in an addressable tile.
    #[error("Object '{object}' lies outside the addressable UDIM range: {source}")]
    TileOutOfRange {
        object: String,
        #[source]
        source: TileError,
    },

    /// Target tile count of zero.
    #[error("Target tile count must be at least 1")]
    ZeroTargetTiles,

    /// Destination index falls past the last UDIM row.
    #[error("{count} destination tiles do not fit in the UDIM grid")]
    TooManyDestinations { count: u32 },

    /// Object's tile has no cell in the grid plan.
    #[error("Object '{object}' is assigned to tile {tile}, which the grid plan does not place")]
    UnplannedTile { object: String, tile: TileIndex },

    /// UV count changed between location and remapping.
    #[error("Object '{object}' has {actual} UVs but was located with {expected}")]
    UvCountMismatch {
        object: String,
        expected: usize,
        actual: usize,
    },
}

impl LayoutError {
    pub fn missing_uvs(object: impl Into<String>) -> Self {
        Self::MissingUvs {
            object: object.into(),
        }
    }

    /// Object the error is attached to, if any.
    pub fn object(&self) -> Option<&str> {
        match self {
            LayoutError::MissingUvs { object }
            | LayoutError::EmptyUvs { object }
            | LayoutError::TileOutOfRange { object, .. }
            | LayoutError::UnplannedTile { object, .. }
            | LayoutError::UvCountMismatch { object, .. } => Some(object),
            LayoutError::ZeroTargetTiles | LayoutError::TooManyDestinations { .. } => None,
        }
    }
}

impl BackendError for LayoutError {
    fn code(&self) -> &'static str {
        match self {
            LayoutError::MissingUvs { .. } => "LAYOUT_001",
            LayoutError::EmptyUvs { .. } => "LAYOUT_002",
            LayoutError::TileOutOfRange { .. } => "LAYOUT_003",
            LayoutError::ZeroTargetTiles => "LAYOUT_004",
            LayoutError::TooManyDestinations { .. } => "LAYOUT_005",
            LayoutError::UnplannedTile { .. } => "LAYOUT_006",
            LayoutError::UvCountMismatch { .. } => "LAYOUT_007",
        }
    }

    fn category(&self) -> &'static str {
        "layout"
    }
}
