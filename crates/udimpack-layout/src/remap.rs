//! UV Remapper.
//!
//! Every UV of an object goes through the same affine map: subtract the
//! origin of the object's assigned tile, scale by `(1/cols, 1/rows)`, then
//! translate to the cell inside the destination tile. The map is a pure
//! scale plus translation with positive factors, so it never flips or folds
//! triangles.

use tracing::{debug, warn};
use udimpack_spec::{CellPlacement, GridPlan, ObjectEntry, TileIndex};

use crate::error::{LayoutError, LayoutResult};
use crate::locate::ObjectTileAssignment;

/// The affine map applied to one object's UVs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvTransform {
    pub source: TileIndex,
    pub placement: CellPlacement,
}

impl UvTransform {
    /// Looks up the transform for an assignment.
    pub fn for_assignment(
        assignment: &ObjectTileAssignment,
        plan: &GridPlan,
    ) -> LayoutResult<Self> {
        let placement = plan
            .placement_of(assignment.tile)
            .ok_or_else(|| LayoutError::UnplannedTile {
                object: assignment.object.clone(),
                tile: assignment.tile,
            })?;
        Ok(Self {
            source: assignment.tile,
            placement,
        })
    }

    pub fn forward(&self, uv: [f64; 2]) -> [f64; 2] {
        let [su, sv] = self.source.origin();
        self.placement.forward([uv[0] - su, uv[1] - sv])
    }

    pub fn inverse(&self, uv: [f64; 2]) -> [f64; 2] {
        let [su, sv] = self.source.origin();
        let [lu, lv] = self.placement.inverse(uv);
        [lu + su, lv + sv]
    }

    /// Scale factors applied on each axis.
    pub fn scale(&self) -> [f64; 2] {
        [
            1.0 / self.placement.shape.cols as f64,
            1.0 / self.placement.shape.rows as f64,
        ]
    }
}

/// Rewrites one object's UVs in place.
pub fn remap_object(
    object: &mut ObjectEntry,
    assignment: &ObjectTileAssignment,
    plan: &GridPlan,
) -> LayoutResult<UvTransform> {
    let transform = UvTransform::for_assignment(assignment, plan)?;
    let uvs = object
        .uvs
        .as_mut()
        .ok_or_else(|| LayoutError::missing_uvs(&object.name))?;
    if uvs.len() != assignment.uv_count {
        return Err(LayoutError::UvCountMismatch {
            object: object.name.clone(),
            expected: assignment.uv_count,
            actual: uvs.len(),
        });
    }

    for uv in uvs.iter_mut() {
        *uv = transform.forward(*uv);
    }
    debug!(
        object = %object.name,
        source = %transform.source,
        destination = %transform.placement.destination,
        row = transform.placement.row,
        col = transform.placement.col,
        "Remapped UVs"
    );
    Ok(transform)
}

/// Remaps every assigned object; objects that fail are left untouched.
///
/// Returns the per-object errors.
pub fn remap_objects(
    objects: &mut [ObjectEntry],
    assignments: &[ObjectTileAssignment],
    plan: &GridPlan,
) -> Vec<LayoutError> {
    let mut failures = Vec::new();
    for assignment in assignments {
        let Some(object) = objects.iter_mut().find(|o| o.name == assignment.object) else {
            failures.push(LayoutError::missing_uvs(&assignment.object));
            continue;
        };
        if let Err(err) = remap_object(object, assignment, plan) {
            warn!(object = %assignment.object, error = %err, "UVs left unchanged");
            failures.push(err);
        }
    }
    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locate::locate_object;
    use crate::planner::plan_grid;

    fn object(name: &str, uvs: Vec<[f64; 2]>) -> ObjectEntry {
        ObjectEntry {
            name: name.to_string(),
            uvs: Some(uvs),
            materials: Vec::new(),
        }
    }

    fn close(a: [f64; 2], b: [f64; 2]) -> bool {
        (a[0] - b[0]).abs() < 1e-9 && (a[1] - b[1]).abs() < 1e-9
    }

    #[test]
    fn test_four_tiles_into_one() {
        // 1001..1004 into one 2x2 tile: 1001 top-left, 1004 bottom-right.
        let mut objects: Vec<ObjectEntry> = (0..4)
            .map(|u| {
                let base = u as f64;
                object(&format!("o{}", u), vec![[base + 0.25, 0.25], [base + 0.75, 0.75]])
            })
            .collect();
        let assignments: Vec<_> = objects.iter().map(|o| locate_object(o).unwrap()).collect();
        let plan = plan_grid(assignments.iter().map(|a| a.tile), 1).unwrap();

        let failures = remap_objects(&mut objects, &assignments, &plan);
        assert!(failures.is_empty());

        let uvs = |i: usize| objects[i].uvs.clone().unwrap();
        assert!(close(uvs(0)[0], [0.125, 0.625]));
        assert!(close(uvs(1)[1], [0.875, 0.875]));
        assert!(close(uvs(2)[0], [0.125, 0.125]));
        assert!(close(uvs(3)[1], [0.875, 0.375]));
    }

    #[test]
    fn test_inverse_restores_original() {
        let original = vec![[3.1, 1.2], [3.9, 1.8], [3.5, 1.05]];
        let mut obj = object("a", original.clone());
        let assignment = locate_object(&obj).unwrap();
        let others = [1001, 1002, 1005, 1011, 1013].map(|n| TileIndex::from_udim(n).unwrap());
        let plan = plan_grid(others.into_iter().chain([assignment.tile]), 2).unwrap();

        let transform = remap_object(&mut obj, &assignment, &plan).unwrap();
        for (moved, before) in obj.uvs.unwrap().iter().zip(&original) {
            assert!(close(transform.inverse(*moved), *before));
        }
    }

    #[test]
    fn test_uvs_crossing_tile_border_stay_contiguous() {
        let mut obj = object("a", vec![[0.9, 0.5], [1.2, 0.5]]);
        let assignment = locate_object(&obj).unwrap();
        let plan = plan_grid([assignment.tile, TileIndex::from_udim(1005).unwrap()], 1).unwrap();
        let transform = remap_object(&mut obj, &assignment, &plan).unwrap();

        let uvs = obj.uvs.unwrap();
        let du = uvs[1][0] - uvs[0][0];
        assert!((du - 0.3 * transform.scale()[0]).abs() < 1e-9);
    }

    #[test]
    fn test_unplanned_tile_leaves_uvs() {
        let original = vec![[5.5, 0.5]];
        let mut objects = vec![object("a", original.clone())];
        let assignment = locate_object(&objects[0]).unwrap();
        let plan = plan_grid([TileIndex::BASE], 1).unwrap();

        let failures = remap_objects(&mut objects, &[assignment], &plan);
        assert!(matches!(failures[0], LayoutError::UnplannedTile { .. }));
        assert_eq!(objects[0].uvs.as_ref().unwrap(), &original);
    }

    #[test]
    fn test_uv_count_change_detected() {
        let mut obj = object("a", vec![[0.5, 0.5]]);
        let assignment = locate_object(&obj).unwrap();
        let plan = plan_grid([assignment.tile], 1).unwrap();
        obj.uvs.as_mut().unwrap().push([0.1, 0.1]);
        assert!(matches!(
            remap_object(&mut obj, &assignment, &plan),
            Err(LayoutError::UvCountMismatch { expected: 1, actual: 2, .. })
        ));
    }
}
