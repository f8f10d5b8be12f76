//! UDIM tile addressing.
//!
//! A UDIM tile is addressed either by its integer `(u, v)` offset from the
//! base tile or by the flattened number `1001 + u + 10 * v`. Only the first
//! ten columns are addressable, so `u` is always in `0..10`.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The UDIM number of the base tile `(0, 0)`.
pub const UDIM_BASE: u32 = 1001;

/// Number of tile columns in one UDIM row.
pub const UDIM_COLUMNS: u32 = 10;

/// Largest UDIM number accepted (`v` capped at 99 rows).
pub const UDIM_MAX: u32 = UDIM_BASE + UDIM_COLUMNS * 100 - 1;

/// Errors produced when converting coordinates or numbers into tiles.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TileError {
    /// The UDIM number is outside `1001..=1999`.
    #[error("UDIM number {0} is outside the valid range 1001..=1999")]
    InvalidUdim(u32),

    /// A UV position floors to a tile that the UDIM convention cannot address.
    #[error("UV position ({u}, {v}) does not lie in an addressable UDIM tile")]
    OutOfRange { u: f64, v: f64 },
}

/// One UDIM tile, ordered by its UDIM number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct TileIndex {
    // Field order matters for the derived `Ord`: row first, then column,
    // which is the same as ordering by UDIM number.
    v: u32,
    u: u32,
}

impl TileIndex {
    /// The base tile `1001`.
    pub const BASE: TileIndex = TileIndex { u: 0, v: 0 };

    /// Creates a tile from its column and row.
    ///
    /// Returns `None` if `u` is not a valid UDIM column or `v` exceeds the
    /// supported row count.
    pub fn new(u: u32, v: u32) -> Option<Self> {
        if u < UDIM_COLUMNS && v < 100 {
            Some(Self { u, v })
        } else {
            None
        }
    }

    /// Creates a tile from its flattened UDIM number.
    pub fn from_udim(udim: u32) -> Result<Self, TileError> {
        if !(UDIM_BASE..=UDIM_MAX).contains(&udim) {
            return Err(TileError::InvalidUdim(udim));
        }
        let offset = udim - UDIM_BASE;
        Ok(Self {
            u: offset % UDIM_COLUMNS,
            v: offset / UDIM_COLUMNS,
        })
    }

    /// Returns the tile containing a UV position using plain floor semantics.
    ///
    /// A coordinate that is exactly an integer belongs to the tile whose
    /// origin equals that integer.
    pub fn containing(u: f64, v: f64) -> Result<Self, TileError> {
        if !u.is_finite() || !v.is_finite() {
            return Err(TileError::OutOfRange { u, v });
        }
        let (fu, fv) = (u.floor(), v.floor());
        if fu < 0.0 || fv < 0.0 {
            return Err(TileError::OutOfRange { u, v });
        }
        Self::new(fu as u32, fv as u32).ok_or(TileError::OutOfRange { u, v })
    }

    /// Column offset from the base tile.
    pub fn u(&self) -> u32 {
        self.u
    }

    /// Row offset from the base tile.
    pub fn v(&self) -> u32 {
        self.v
    }

    /// The flattened UDIM number (`1001 + u + 10 * v`).
    pub fn udim(&self) -> u32 {
        UDIM_BASE + self.u + UDIM_COLUMNS * self.v
    }

    /// The UV-space origin (lower-left corner) of this tile.
    pub fn origin(&self) -> [f64; 2] {
        [self.u as f64, self.v as f64]
    }
}

impl fmt::Display for TileIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.udim())
    }
}

impl TryFrom<u32> for TileIndex {
    type Error = TileError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::from_udim(value)
    }
}

impl From<TileIndex> for u32 {
    fn from(tile: TileIndex) -> Self {
        tile.udim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_udim_numbering() {
        assert_eq!(TileIndex::BASE.udim(), 1001);
        assert_eq!(TileIndex::new(9, 0).unwrap().udim(), 1010);
        assert_eq!(TileIndex::new(0, 1).unwrap().udim(), 1011);
        assert_eq!(TileIndex::new(3, 2).unwrap().udim(), 1024);
    }

    #[test]
    fn test_from_udim_round_trip() {
        let tile = TileIndex::from_udim(1024).unwrap();
        assert_eq!((tile.u(), tile.v()), (3, 2));
        assert_eq!(tile.to_string(), "1024");
    }

    #[test]
    fn test_from_udim_rejects_out_of_range() {
        assert_eq!(TileIndex::from_udim(1000), Err(TileError::InvalidUdim(1000)));
        assert!(TileIndex::from_udim(2000).is_err());
    }

    #[test]
    fn test_new_rejects_column_ten() {
        assert!(TileIndex::new(10, 0).is_none());
    }

    #[test]
    fn test_containing_uses_floor() {
        assert_eq!(TileIndex::containing(0.5, 0.5).unwrap().udim(), 1001);
        assert_eq!(TileIndex::containing(2.0, 0.25).unwrap().udim(), 1003);
        assert_eq!(TileIndex::containing(1.999, 1.0).unwrap().udim(), 1012);
    }

    #[test]
    fn test_containing_rejects_negative_and_nan() {
        assert!(TileIndex::containing(-0.1, 0.5).is_err());
        assert!(TileIndex::containing(f64::NAN, 0.5).is_err());
        assert!(TileIndex::containing(10.5, 0.5).is_err());
    }

    #[test]
    fn test_ordering_matches_udim_number() {
        let mut tiles = vec![
            TileIndex::new(0, 1).unwrap(),
            TileIndex::new(9, 0).unwrap(),
            TileIndex::BASE,
        ];
        tiles.sort();
        let numbers: Vec<u32> = tiles.iter().map(TileIndex::udim).collect();
        assert_eq!(numbers, vec![1001, 1010, 1011]);
    }

    #[test]
    fn test_serde_as_number() {
        let tile = TileIndex::new(1, 0).unwrap();
        assert_eq!(serde_json::to_string(&tile).unwrap(), "1002");
        let parsed: TileIndex = serde_json::from_str("1012").unwrap();
        assert_eq!(parsed, TileIndex::new(1, 1).unwrap());
        assert!(serde_json::from_str::<TileIndex>("999").is_err());
    }
}
