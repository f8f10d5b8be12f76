//! udimpack layout stage
//!
//! Pure geometry on UV data, with no image access:
//!
//! - [`locate`]: assigns each object to the UDIM tile holding its UV bounding-box center
//! - [`planner`]: packs the distinct source tiles into the destination tiles
//! - [`remap`]: moves each object's UVs into its cell of the plan
//!
//! # Example
//!
//! ```
//! use udimpack_layout::{locate_objects, plan_grid, remap_objects};
//! use udimpack_spec::ObjectEntry;
//!
//! let mut objects = vec![
//!     ObjectEntry { name: "a".into(), uvs: Some(vec![[0.2, 0.2], [0.8, 0.8]]), materials: vec![] },
//!     ObjectEntry { name: "b".into(), uvs: Some(vec![[1.2, 0.2], [1.8, 0.8]]), materials: vec![] },
//! ];
//! let located = locate_objects(&objects);
//! let plan = plan_grid(located.source_tiles(), 1).unwrap();
//! assert_eq!(plan.destinations[0].shape.cols, 2);
//!
//! let failures = remap_objects(&mut objects, &located.assignments, &plan);
//! assert!(failures.is_empty());
//! ```

pub mod error;
pub mod locate;
pub mod planner;
pub mod remap;

pub use error::{LayoutError, LayoutResult};
pub use locate::{
    locate_object, locate_objects, touched_tiles, uv_tile, LocateOutcome, ObjectTileAssignment,
    UvBounds,
};
pub use planner::{destination_tile, plan_grid};
pub use remap::{remap_object, remap_objects, UvTransform};
