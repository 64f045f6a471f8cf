//! Seats and the players sitting in them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Grid, Tile};

/// A seat at the table, `0..MAX_PLAYERS`.
///
/// Seat ids are stable for the lifetime of a connection; seat 0 is the
/// host. Serialized as the bare number.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SeatId(pub u8);

impl SeatId {
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seat-{}", self.0)
    }
}

/// A participant: who they are, the rack they hold and whether they have
/// already made their opening play.
#[derive(Debug, Clone)]
pub struct Player {
    name: String,
    age: u32,
    rack: Grid,
    played_first_move: bool,
}

impl Player {
    pub fn new(name: impl Into<String>, age: u32) -> Self {
        Self {
            name: name.into(),
            age,
            rack: Grid::rack(),
            played_first_move: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn rack(&self) -> &Grid {
        &self.rack
    }

    pub(crate) fn rack_mut(&mut self) -> &mut Grid {
        &mut self.rack
    }

    pub fn hand_size(&self) -> usize {
        self.rack.len()
    }

    pub fn has_played_first_move(&self) -> bool {
        self.played_first_move
    }

    pub(crate) fn mark_first_move(&mut self) {
        self.played_first_move = true;
    }

    /// Final score: the negated sum of the tiles left on the rack.
    pub fn score(&self) -> i32 {
        -self.rack.points()
    }

    /// Puts `tile` in the first free rack cell (row-major).
    ///
    /// Returns the tile back if the rack is full.
    pub(crate) fn push_tile(&mut self, tile: Tile) -> Result<(), Tile> {
        match self.rack.first_free() {
            Some(coord) => {
                self.rack.set(coord, Some(tile));
                Ok(())
            }
            None => Err(tile),
        }
    }

    /// Empties the rack and resets the opening-play flag for a new game.
    pub(crate) fn reset_for_new_game(&mut self) -> Vec<Tile> {
        self.played_first_move = false;
        self.rack.drain()
    }

    /// Groups tiles of equal rank, colors ascending within a rank.
    pub(crate) fn sort_rack_by_group(&mut self) {
        self.sort_rack_by_key(|tile| (tile.rank(), tile.color()));
    }

    /// Groups tiles of equal color, ranks ascending within a color.
    pub(crate) fn sort_rack_by_run(&mut self) {
        self.sort_rack_by_key(|tile| (tile.color(), tile.rank()));
    }

    fn sort_rack_by_key<K: Ord>(&mut self, key: impl Fn(&Tile) -> K) {
        // Nothing worth arranging below the size of the smallest set.
        if self.rack.len() < crate::rules::MIN_SET_SIZE {
            return;
        }
        self.rack.relayout_sorted_by(|a, b| key(a).cmp(&key(b)));
    }
}
