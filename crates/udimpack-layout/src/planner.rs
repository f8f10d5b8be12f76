//! Grid Planner.
//!
//! Packs `S` distinct source tiles into at most `M` destination tiles.
//! Sources are sorted by UDIM number and dealt out `K = ceil(S / M)` at a
//! time, so every destination but the last holds exactly `K` tiles. Each
//! destination gets the most square grid that fits its tiles. Destination
//! `i` sits at column `i % W`, row `i / W` of the UDIM grid, where
//! `W = ceil(sqrt(M))` capped at the ten UDIM columns.

use std::collections::BTreeSet;

use tracing::{debug, info};
use udimpack_spec::tile::UDIM_COLUMNS;
use udimpack_spec::{DestinationTile, GridPlan, GridShape, TileIndex};

use crate::error::{LayoutError, LayoutResult};

/// Tile index of the `index`-th destination for a target count.
pub fn destination_tile(index: u32, target_count: u32) -> LayoutResult<TileIndex> {
    let per_row = GridShape::for_count(target_count).cols.min(UDIM_COLUMNS);
    TileIndex::new(index % per_row, index / per_row)
        .ok_or(LayoutError::TooManyDestinations { count: index + 1 })
}

/// Computes the grid plan for a set of source tiles.
///
/// The result depends only on the set of tiles and `target_count`, never on
/// input order or duplicates.
pub fn plan_grid(
    source_tiles: impl IntoIterator<Item = TileIndex>,
    target_count: u32,
) -> LayoutResult<GridPlan> {
    if target_count == 0 {
        return Err(LayoutError::ZeroTargetTiles);
    }

    let sorted: Vec<TileIndex> = source_tiles
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if sorted.is_empty() {
        return Ok(GridPlan {
            target_count,
            destinations: Vec::new(),
        });
    }

    let per_destination = sorted.len().div_ceil(target_count as usize);
    let mut destinations = Vec::new();
    for (index, chunk) in sorted.chunks(per_destination).enumerate() {
        let tile = destination_tile(index as u32, target_count)?;
        let shape = GridShape::for_count(chunk.len() as u32);
        debug!(
            destination = %tile,
            rows = shape.rows,
            cols = shape.cols,
            sources = chunk.len(),
            "Planned destination tile"
        );
        destinations.push(DestinationTile {
            tile,
            shape,
            cells: chunk.to_vec(),
        });
    }

    info!(
        sources = sorted.len(),
        target = target_count,
        destinations = destinations.len(),
        per_destination,
        "Grid plan computed"
    );
    Ok(GridPlan {
        target_count,
        destinations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tiles(numbers: &[u32]) -> Vec<TileIndex> {
        numbers
            .iter()
            .map(|&n| TileIndex::from_udim(n).unwrap())
            .collect()
    }

    fn first_row(count: u32) -> Vec<TileIndex> {
        (0..count).map(|u| TileIndex::new(u % 10, u / 10).unwrap()).collect()
    }

    #[test]
    fn test_thirteen_into_two() {
        let plan = plan_grid(first_row(13), 2).unwrap();
        assert_eq!(plan.destinations.len(), 2);

        let first = &plan.destinations[0];
        assert_eq!(first.tile.udim(), 1001);
        assert_eq!((first.shape.rows, first.shape.cols), (3, 3));
        assert_eq!(first.cells.len(), 7);

        let second = &plan.destinations[1];
        assert_eq!(second.tile.udim(), 1002);
        assert_eq!((second.shape.rows, second.shape.cols), (2, 3));
        assert_eq!(second.cells.len(), 6);

        let total_cells: u32 = plan.destinations.iter().map(|d| d.shape.cell_count()).sum();
        assert!(total_cells >= 13);
        assert_eq!(plan.source_tiles().count(), 13);
    }

    #[test]
    fn test_single_source_is_passthrough() {
        let plan = plan_grid(tiles(&[1005]), 2).unwrap();
        assert_eq!(plan.destinations.len(), 1);
        let dest = &plan.destinations[0];
        assert_eq!((dest.shape.rows, dest.shape.cols), (1, 1));
        assert_eq!(dest.cells, tiles(&[1005]));
        assert!(plan.is_passthrough());
    }

    #[test]
    fn test_fewer_sources_than_targets() {
        let plan = plan_grid(tiles(&[1012, 1001, 1003]), 4).unwrap();
        assert!(plan.is_passthrough());
        let placed: Vec<(u32, u32)> = plan
            .destinations
            .iter()
            .map(|d| (d.tile.udim(), d.cells[0].udim()))
            .collect();
        assert_eq!(placed, vec![(1001, 1001), (1002, 1003), (1011, 1012)]);
    }

    #[test]
    fn test_destination_layout_wraps_rows() {
        // ceil(sqrt(5)) = 3 destinations per UDIM row.
        let plan = plan_grid(first_row(5), 5).unwrap();
        let udims: Vec<u32> = plan.destinations.iter().map(|d| d.tile.udim()).collect();
        assert_eq!(udims, vec![1001, 1002, 1003, 1011, 1012]);
    }

    #[test]
    fn test_cells_fill_row_major_in_udim_order() {
        let plan = plan_grid(tiles(&[1004, 1002, 1001, 1003]), 1).unwrap();
        let dest = &plan.destinations[0];
        assert_eq!(dest.cells, tiles(&[1001, 1002, 1003, 1004]));
        let p = plan.placement_of(TileIndex::from_udim(1003).unwrap()).unwrap();
        assert_eq!((p.row, p.col), (1, 0));
    }

    #[test]
    fn test_duplicates_ignored() {
        let a = plan_grid(tiles(&[1001, 1002, 1002, 1001]), 1).unwrap();
        let b = plan_grid(tiles(&[1002, 1001]), 1).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_and_invalid_targets() {
        assert!(plan_grid(Vec::new(), 2).unwrap().destinations.is_empty());
        assert_eq!(plan_grid(tiles(&[1001]), 0), Err(LayoutError::ZeroTargetTiles));
    }

    #[test]
    fn test_large_target_count_wraps_at_ten_columns() {
        let plan = plan_grid(first_row(12), 150).unwrap();
        assert!(plan.is_passthrough());
        let udims: Vec<u32> = plan.destinations.iter().map(|d| d.tile.udim()).collect();
        assert_eq!(
            udims,
            vec![1001, 1002, 1003, 1004, 1005, 1006, 1007, 1008, 1009, 1010, 1011, 1012]
        );
        assert_eq!(destination_tile(999, 5000).unwrap().udim(), 2000);
        assert_eq!(
            destination_tile(1000, 5000),
            Err(LayoutError::TooManyDestinations { count: 1001 })
        );
    }
}
