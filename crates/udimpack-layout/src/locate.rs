//! Tile Locator.
//!
//! Each object is assigned to exactly one source tile: the tile containing
//! the center of its UV bounding box, found with plain floor semantics.
//! Objects whose UVs spread over several tiles are still assigned by their
//! center; this is an approximation, not a per-face classification.

use std::collections::BTreeSet;

use tracing::{debug, warn};
use udimpack_spec::{ObjectEntry, TileIndex};

use crate::error::{LayoutError, LayoutResult};

/// Axis-aligned UV bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvBounds {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl UvBounds {
    /// Bounds of a point set; `None` for an empty set.
    pub fn of(uvs: &[[f64; 2]]) -> Option<Self> {
        let (first, rest) = uvs.split_first()?;
        let mut bounds = Self {
            min: *first,
            max: *first,
        };
        for uv in rest {
            for axis in 0..2 {
                bounds.min[axis] = bounds.min[axis].min(uv[axis]);
                bounds.max[axis] = bounds.max[axis].max(uv[axis]);
            }
        }
        Some(bounds)
    }

    pub fn center(&self) -> [f64; 2] {
        [
            (self.min[0] + self.max[0]) / 2.0,
            (self.min[1] + self.max[1]) / 2.0,
        ]
    }

    pub fn width(&self) -> f64 {
        self.max[0] - self.min[0]
    }

    pub fn height(&self) -> f64 {
        self.max[1] - self.min[1]
    }

    /// True when the box is at least one tile wide or tall.
    pub fn spans_multiple_tiles(&self) -> bool {
        self.width() >= 1.0 || self.height() >= 1.0
    }
}

/// The tile one object was assigned to.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectTileAssignment {
    pub object: String,
    pub tile: TileIndex,
    pub bounds: UvBounds,
    /// Number of UVs seen when locating; remapping checks it again.
    pub uv_count: usize,
}

/// Assigns one object to the tile containing its UV bounding-box center.
pub fn locate_object(object: &ObjectEntry) -> LayoutResult<ObjectTileAssignment> {
    let uvs = object
        .uvs
        .as_deref()
        .ok_or_else(|| LayoutError::missing_uvs(&object.name))?;
    let bounds = UvBounds::of(uvs).ok_or_else(|| LayoutError::EmptyUvs {
        object: object.name.clone(),
    })?;

    let [cu, cv] = bounds.center();
    let tile = TileIndex::containing(cu, cv).map_err(|source| LayoutError::TileOutOfRange {
        object: object.name.clone(),
        source,
    })?;

    if bounds.spans_multiple_tiles() {
        debug!(
            object = %object.name,
            tile = %tile,
            width = bounds.width(),
            height = bounds.height(),
            "UVs span several tiles, assigning by bounding-box center"
        );
    }

    Ok(ObjectTileAssignment {
        object: object.name.clone(),
        tile,
        bounds,
        uv_count: uvs.len(),
    })
}

/// Assignments and per-object failures for a selection.
#[derive(Debug, Default)]
pub struct LocateOutcome {
    /// Successful assignments, in selection order.
    pub assignments: Vec<ObjectTileAssignment>,
    /// Objects excluded from the run.
    pub failures: Vec<LayoutError>,
}

impl LocateOutcome {
    /// Distinct assigned tiles in ascending UDIM order.
    pub fn source_tiles(&self) -> BTreeSet<TileIndex> {
        self.assignments.iter().map(|a| a.tile).collect()
    }

    pub fn assignment(&self, object: &str) -> Option<&ObjectTileAssignment> {
        self.assignments.iter().find(|a| a.object == object)
    }
}

/// Locates every object; failing objects are logged and skipped.
pub fn locate_objects<'a>(objects: impl IntoIterator<Item = &'a ObjectEntry>) -> LocateOutcome {
    let mut outcome = LocateOutcome::default();
    for object in objects {
        match locate_object(object) {
            Ok(assignment) => {
                debug!(object = %assignment.object, tile = %assignment.tile, "Located object");
                outcome.assignments.push(assignment);
            }
            Err(err) => {
                warn!(object = %object.name, error = %err, "Skipping object");
                outcome.failures.push(err);
            }
        }
    }
    outcome
}

/// Tile holding a single UV point, for inspection.
///
/// Unlike [`TileIndex::containing`], a coordinate that is an exact positive
/// integer counts toward the tile below or to the left, so a UV sitting on
/// the upper edge of tile 1001 is counted in 1001.
pub fn uv_tile(u: f64, v: f64) -> Option<TileIndex> {
    fn axis(x: f64) -> Option<u32> {
        if !x.is_finite() || x < 0.0 {
            return None;
        }
        let floor = x.floor();
        if x > 0.0 && x == floor {
            Some(floor as u32 - 1)
        } else {
            Some(floor as u32)
        }
    }
    TileIndex::new(axis(u)?, axis(v)?)
}

/// Distinct tiles touched by any UV of the given objects.
pub fn touched_tiles<'a>(
    objects: impl IntoIterator<Item = &'a ObjectEntry>,
) -> BTreeSet<TileIndex> {
    objects
        .into_iter()
        .filter_map(|o| o.uvs.as_deref())
        .flatten()
        .filter_map(|&[u, v]| uv_tile(u, v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(name: &str, uvs: Option<Vec<[f64; 2]>>) -> ObjectEntry {
        ObjectEntry {
            name: name.to_string(),
            uvs,
            materials: Vec::new(),
        }
    }

    #[test]
    fn test_inside_one_tile() {
        let obj = object("a", Some(vec![[2.1, 1.1], [2.9, 1.4], [2.5, 1.8]]));
        let assignment = locate_object(&obj).unwrap();
        assert_eq!(assignment.tile.udim(), 1013);
        assert_eq!(assignment.uv_count, 3);
    }

    #[test]
    fn test_center_on_boundary_floors() {
        // Center u is exactly 2.0, which belongs to the tile with origin 2.
        let obj = object("a", Some(vec![[1.5, 0.2], [2.5, 0.8]]));
        assert_eq!(locate_object(&obj).unwrap().tile.udim(), 1003);
    }

    #[test]
    fn test_spread_object_uses_center() {
        let obj = object("a", Some(vec![[0.1, 0.1], [2.6, 0.9]]));
        let assignment = locate_object(&obj).unwrap();
        assert!(assignment.bounds.spans_multiple_tiles());
        assert_eq!(assignment.tile.udim(), 1002);
    }

    #[test]
    fn test_missing_and_empty_uvs() {
        assert_eq!(
            locate_object(&object("a", None)),
            Err(LayoutError::missing_uvs("a"))
        );
        assert!(matches!(
            locate_object(&object("b", Some(vec![]))),
            Err(LayoutError::EmptyUvs { .. })
        ));
    }

    #[test]
    fn test_negative_center_rejected() {
        let obj = object("a", Some(vec![[-0.5, 0.5], [-0.2, 0.6]]));
        assert!(matches!(
            locate_object(&obj),
            Err(LayoutError::TileOutOfRange { .. })
        ));
    }

    #[test]
    fn test_locate_objects_skips_failures() {
        let objects = vec![
            object("a", Some(vec![[0.5, 0.5]])),
            object("b", None),
            object("c", Some(vec![[1.5, 0.5]])),
            object("d", Some(vec![[0.2, 0.2]])),
        ];
        let outcome = locate_objects(&objects);
        assert_eq!(outcome.assignments.len(), 3);
        assert_eq!(outcome.failures.len(), 1);
        let tiles: Vec<u32> = outcome.source_tiles().iter().map(TileIndex::udim).collect();
        assert_eq!(tiles, vec![1001, 1002]);
    }

    #[test]
    fn test_uv_tile_boundary_rule() {
        assert_eq!(uv_tile(0.0, 0.0).unwrap().udim(), 1001);
        assert_eq!(uv_tile(1.0, 0.5).unwrap().udim(), 1001);
        assert_eq!(uv_tile(1.0, 1.0).unwrap().udim(), 1001);
        assert_eq!(uv_tile(1.25, 1.0).unwrap().udim(), 1002);
        assert!(uv_tile(-0.5, 0.5).is_none());
    }

    #[test]
    fn test_touched_tiles() {
        let objects = vec![
            object("a", Some(vec![[0.5, 0.5], [1.0, 1.0], [1.5, 0.5]])),
            object("b", None),
        ];
        let tiles: Vec<u32> = touched_tiles(&objects).iter().map(TileIndex::udim).collect();
        assert_eq!(tiles, vec![1001, 1002]);
    }
}
