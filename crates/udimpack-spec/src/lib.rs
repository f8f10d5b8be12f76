//! udimpack data model
//!
//! Types shared by every stage of the UDIM combine pipeline: tile
//! addressing, semantic texture channels, material graph and scene
//! snapshots, grid plans, run configuration and run reports.
//!
//! # Example
//!
//! ```
//! use udimpack_spec::{ChannelKind, Colorspace, TileIndex};
//!
//! let tile = TileIndex::containing(2.5, 1.25).unwrap();
//! assert_eq!(tile.udim(), 1013);
//!
//! let normal = ChannelKind::from_name("Normal");
//! assert_eq!(normal.expected_colorspace(), Some(Colorspace::NonColor));
//! ```
//!
//! # Modules
//!
//! - [`tile`]: UDIM tile indices
//! - [`channel`]: Channel kinds, colorspace tags and the channel table
//! - [`graph`]: Immutable material node graphs
//! - [`scene`]: Host scene snapshot (objects, materials, images)
//! - [`plan`]: Grid plan types
//! - [`config`]: Run configuration
//! - [`report`]: Run report and builder
//! - [`naming`]: Output directory and file names
//! - [`error`]: Shared error trait and run-level issue codes

pub mod channel;
pub mod config;
pub mod error;
pub mod graph;
pub mod naming;
pub mod plan;
pub mod report;
pub mod scene;
pub mod tile;

pub use channel::{
    custom_name_from_image, ChannelKind, ChannelProfile, ChannelRecord, Colorspace,
    WellKnownChannel, CHANNEL_TABLE,
};
pub use config::{ConfigError, OutputFormat, ResolutionPolicy, RunConfig};
pub use error::BackendError;
pub use graph::{GraphError, LinkSpec, MaterialGraph, NodeKind, NodeSpec};
pub use plan::{CellPlacement, DestinationTile, GridPlan, GridShape, UvRect};
pub use report::{
    BitDepth, IssueUnit, ObjectSummary, OutputRecord, ReportBuilder, ReportIssue, RunReport,
    REPORT_VERSION,
};
pub use scene::{ImageEntry, MaterialEntry, ObjectEntry, Scene, SceneError, UDIM_MARKER};
pub use tile::{TileError, TileIndex};
