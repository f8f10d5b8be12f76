//! Grid plan types.
//!
//! A [`GridPlan`] assigns every source tile to one cell of one destination
//! tile. Cells are numbered row-major, left to right and top to bottom in
//! visual order. In UV space (origin bottom-left) row `r` of `R` rows covers
//! `v` in `[(R-1-r)/R, (R-r)/R]` of the destination tile.

use serde::{Deserialize, Serialize};

use crate::tile::TileIndex;

/// Rows and columns of a destination tile's grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridShape {
    pub rows: u32,
    pub cols: u32,
}

impl GridShape {
    /// The most square shape holding `n` cells with `cols >= rows`.
    ///
    /// `cols = ceil(sqrt(n))`, `rows = ceil(n / cols)`; `n == 0` yields 1x1.
    pub fn for_count(n: u32) -> Self {
        if n <= 1 {
            return Self { rows: 1, cols: 1 };
        }
        let mut cols = (n as f64).sqrt().ceil() as u32;
        // Guard against float rounding on perfect squares.
        while cols > 1 && (cols - 1) * (cols - 1) >= n {
            cols -= 1;
        }
        while cols * cols < n {
            cols += 1;
        }
        let rows = n.div_ceil(cols);
        Self { rows, cols }
    }

    /// Total number of cells.
    pub fn cell_count(&self) -> u32 {
        self.rows * self.cols
    }
}

/// A destination tile and the ordered source tiles packed into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationTile {
    pub tile: TileIndex,
    pub shape: GridShape,
    /// Source tiles in row-major cell order; may be shorter than the cell count.
    pub cells: Vec<TileIndex>,
}

impl DestinationTile {
    /// Placement of the cell at `index` in row-major order.
    pub fn placement(&self, index: usize) -> Option<CellPlacement> {
        if index >= self.shape.cell_count() as usize {
            return None;
        }
        let cols = self.shape.cols as usize;
        Some(CellPlacement {
            destination: self.tile,
            shape: self.shape,
            row: (index / cols) as u32,
            col: (index % cols) as u32,
        })
    }
}

/// A rectangle in tile-local UV space (`0..=1` on both axes).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UvRect {
    pub u_min: f64,
    pub v_min: f64,
    pub u_max: f64,
    pub v_max: f64,
}

/// Where one source tile lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellPlacement {
    pub destination: TileIndex,
    pub shape: GridShape,
    /// Row counted from the top of the tile.
    pub row: u32,
    /// Column counted from the left of the tile.
    pub col: u32,
}

impl CellPlacement {
    /// The cell's rectangle in destination-local UV space.
    pub fn uv_rect(&self) -> UvRect {
        let rows = self.shape.rows as f64;
        let cols = self.shape.cols as f64;
        let v_row = (self.shape.rows - 1 - self.row) as f64;
        UvRect {
            u_min: self.col as f64 / cols,
            v_min: v_row / rows,
            u_max: (self.col + 1) as f64 / cols,
            v_max: (v_row + 1.0) / rows,
        }
    }

    /// Maps a source-tile-local UV (`0..=1`) to absolute destination UV space.
    pub fn forward(&self, local: [f64; 2]) -> [f64; 2] {
        let rect = self.uv_rect();
        let [du, dv] = self.destination.origin();
        [
            du + rect.u_min + local[0] / self.shape.cols as f64,
            dv + rect.v_min + local[1] / self.shape.rows as f64,
        ]
    }

    /// Inverse of [`forward`](Self::forward): absolute destination UV to source-tile-local UV.
    pub fn inverse(&self, uv: [f64; 2]) -> [f64; 2] {
        let rect = self.uv_rect();
        let [du, dv] = self.destination.origin();
        [
            (uv[0] - du - rect.u_min) * self.shape.cols as f64,
            (uv[1] - dv - rect.v_min) * self.shape.rows as f64,
        ]
    }
}

/// The packing of all source tiles into destination tiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridPlan {
    /// Requested destination tile count `M`.
    pub target_count: u32,
    /// Destination tiles actually used, in creation order.
    pub destinations: Vec<DestinationTile>,
}

impl GridPlan {
    /// Finds where a source tile was placed.
    pub fn placement_of(&self, source: TileIndex) -> Option<CellPlacement> {
        self.destinations.iter().find_map(|dest| {
            dest.cells
                .iter()
                .position(|&t| t == source)
                .and_then(|i| dest.placement(i))
        })
    }

    /// All placed source tiles, in plan order.
    pub fn source_tiles(&self) -> impl Iterator<Item = TileIndex> + '_ {
        self.destinations.iter().flat_map(|d| d.cells.iter().copied())
    }

    /// True when every destination holds a single source tile in a 1x1 grid.
    pub fn is_passthrough(&self) -> bool {
        self.destinations
            .iter()
            .all(|d| d.shape.cell_count() == 1 && d.cells.len() == 1)
    }

    /// Largest column count over all destination grids.
    pub fn max_cols(&self) -> u32 {
        self.destinations
            .iter()
            .map(|d| d.shape.cols)
            .max()
            .unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile(udim: u32) -> TileIndex {
        TileIndex::from_udim(udim).unwrap()
    }

    #[test]
    fn test_shape_for_count() {
        let cases = [
            (0, (1, 1)),
            (1, (1, 1)),
            (2, (1, 2)),
            (3, (2, 2)),
            (4, (2, 2)),
            (5, (2, 3)),
            (6, (2, 3)),
            (7, (3, 3)),
            (9, (3, 3)),
            (10, (3, 4)),
            (13, (4, 4)),
            (16, (4, 4)),
        ];
        for (n, (rows, cols)) in cases {
            let shape = GridShape::for_count(n);
            assert_eq!((shape.rows, shape.cols), (rows, cols), "n = {}", n);
            assert!(shape.cell_count() >= n);
            assert!(shape.cols >= shape.rows);
        }
    }

    #[test]
    fn test_uv_rect_rows_count_from_top() {
        let shape = GridShape { rows: 2, cols: 2 };
        let top_left = CellPlacement {
            destination: TileIndex::BASE,
            shape,
            row: 0,
            col: 0,
        };
        let rect = top_left.uv_rect();
        assert_eq!((rect.u_min, rect.v_min, rect.u_max, rect.v_max), (0.0, 0.5, 0.5, 1.0));

        let bottom_right = CellPlacement { row: 1, col: 1, ..top_left };
        let rect = bottom_right.uv_rect();
        assert_eq!((rect.u_min, rect.v_min, rect.u_max, rect.v_max), (0.5, 0.0, 1.0, 0.5));
    }

    #[test]
    fn test_forward_inverse() {
        let placement = CellPlacement {
            destination: tile(1002),
            shape: GridShape { rows: 2, cols: 3 },
            row: 1,
            col: 2,
        };
        let local = [0.25, 0.75];
        let uv = placement.forward(local);
        assert!((uv[0] - (1.0 + 2.0 / 3.0 + 0.25 / 3.0)).abs() < 1e-12);
        assert!((uv[1] - 0.375).abs() < 1e-12);
        let back = placement.inverse(uv);
        assert!((back[0] - local[0]).abs() < 1e-12);
        assert!((back[1] - local[1]).abs() < 1e-12);
    }

    #[test]
    fn test_placement_of() {
        let plan = GridPlan {
            target_count: 1,
            destinations: vec![DestinationTile {
                tile: TileIndex::BASE,
                shape: GridShape { rows: 1, cols: 2 },
                cells: vec![tile(1001), tile(1005)],
            }],
        };
        let placement = plan.placement_of(tile(1005)).unwrap();
        assert_eq!((placement.row, placement.col), (0, 1));
        assert!(plan.placement_of(tile(1003)).is_none());
        assert!(!plan.is_passthrough());
    }
}
