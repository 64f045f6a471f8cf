//! Primitive value types: coordinates, colors and tiles.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::rules::{JOKER_POINTS, MAX_RANK, MIN_RANK};

// ---------------------------------------------------------------------------
// Coordinate
// ---------------------------------------------------------------------------

/// A cell position on a grid, as `(column, row)`.
///
/// Columns grow to the right and rows grow downward. Signed so that
/// shifted positions computed during set moves can be tested against the
/// grid bounds instead of wrapping.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Coordinate {
    pub col: i32,
    pub row: i32,
}

impl Coordinate {
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    /// The same row, `offset` columns to the right (left if negative).
    pub const fn shifted(self, offset: i32) -> Self {
        Self {
            col: self.col + offset,
            row: self.row,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.col, self.row)
    }
}

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// Tile color. `Joker` marks the wildcard.
///
/// The declaration order is the sort order used when a rack is sorted.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Color {
    Red,
    Black,
    Yellow,
    Blue,
    Joker,
}

impl Color {
    /// The four regular colors, in pile order.
    pub const REGULAR: [Color; 4] =
        [Color::Red, Color::Black, Color::Yellow, Color::Blue];
}

// ---------------------------------------------------------------------------
// Tile
// ---------------------------------------------------------------------------

/// A single tile.
///
/// Tiles are immutable. A joker always reports [`JOKER_POINTS`] as its
/// rank; the value it stands for inside a set is computed by the
/// validator and never written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    color: Color,
    rank: u8,
}

impl Tile {
    /// Creates a regular tile.
    ///
    /// Passing [`Color::Joker`] yields a joker regardless of `rank`.
    pub fn new(color: Color, rank: u8) -> Self {
        if color == Color::Joker {
            return Self::joker();
        }
        debug_assert!((MIN_RANK..=MAX_RANK).contains(&rank));
        Self { color, rank }
    }

    pub const fn joker() -> Self {
        Self {
            color: Color::Joker,
            rank: JOKER_POINTS,
        }
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn rank(&self) -> u8 {
        self.rank
    }

    pub fn is_joker(&self) -> bool {
        self.color == Color::Joker
    }

    /// Value counted against a player holding this tile on their rack.
    pub fn points(&self) -> i32 {
        i32::from(self.rank)
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_joker() {
            f.write_str("joker")
        } else {
            write!(f, "{:?} {}", self.color, self.rank)
        }
    }
}
