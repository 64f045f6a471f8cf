//! Board consistency: every horizontal run of tiles must be a valid set.
//!
//! A *group* is 3–4 tiles of one rank in pairwise distinct colors. A
//! *run* is 3 or more tiles of one color with consecutive ranks, where
//! 1 may follow 13. Jokers stand in for whatever tile the set needs at
//! their position; the substituted rank is computed here and returned,
//! never stored on the tile.

use std::collections::HashSet;

use crate::rules::{MAX_GROUP_SIZE, MAX_RANK, MIN_SET_SIZE};
use crate::{Coordinate, Grid, Tile};

/// Which kind of set a run of tiles forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetKind {
    Group,
    Run,
}

/// A validated set on the board with jokers resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meld {
    pub first: Coordinate,
    pub kind: SetKind,
    /// Effective rank of every tile, left to right.
    pub ranks: Vec<u8>,
}

impl Meld {
    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }

    pub fn points(&self) -> i32 {
        self.ranks.iter().map(|r| i32::from(*r)).sum()
    }
}

/// Splits the board into maximal horizontal runs and validates each one.
///
/// # Errors
/// Returns the leftmost coordinate of the first run (in row-major order)
/// that is neither a group nor a run.
pub fn check_board(board: &Grid) -> Result<Vec<Meld>, Coordinate> {
    let mut seen: HashSet<Coordinate> = HashSet::with_capacity(board.len());
    let mut melds = Vec::new();

    for coord in board.occupied() {
        if seen.contains(&coord) {
            continue;
        }
        let first = board.first_of_run(coord);
        let len = board.run_length(first);
        seen.extend((0..len).map(|i| first.shifted(i as i32)));

        let tiles = board.run_tiles(first, len);
        let (kind, ranks) = classify(&tiles).ok_or(first)?;
        melds.push(Meld { first, kind, ranks });
    }

    Ok(melds)
}

/// `true` if every run on the board is a valid set. An empty board is
/// consistent.
pub fn is_consistent(board: &Grid) -> bool {
    check_board(board).is_ok()
}

/// Points on a consistent board, jokers counted at their resolved rank.
/// `None` if the board is inconsistent.
pub fn board_points(board: &Grid) -> Option<i32> {
    check_board(board)
        .ok()
        .map(|melds| melds.iter().map(Meld::points).sum())
}

/// Classifies a left-to-right sequence of tiles, returning the set kind
/// and the effective rank of every tile. Groups win ties.
pub fn classify(tiles: &[Tile]) -> Option<(SetKind, Vec<u8>)> {
    if tiles.len() < MIN_SET_SIZE {
        return None;
    }

    let Some((anchor_index, anchor)) =
        tiles.iter().enumerate().find(|(_, t)| !t.is_joker())
    else {
        // Nothing but jokers: any consecutive ranks will do.
        return Some((SetKind::Run, run_ranks(1, tiles.len())));
    };

    if is_group(tiles, anchor.rank()) {
        return Some((SetKind::Group, vec![anchor.rank(); tiles.len()]));
    }

    let start = wrap_rank(i32::from(anchor.rank()) - anchor_index as i32);
    if is_run(tiles, *anchor, start) {
        return Some((SetKind::Run, run_ranks(start, tiles.len())));
    }

    None
}

fn is_group(tiles: &[Tile], rank: u8) -> bool {
    if tiles.len() > MAX_GROUP_SIZE {
        return false;
    }
    let mut colors = HashSet::new();
    tiles
        .iter()
        .filter(|t| !t.is_joker())
        .all(|t| t.rank() == rank && colors.insert(t.color()))
}

fn is_run(tiles: &[Tile], anchor: Tile, start: u8) -> bool {
    tiles
        .iter()
        .zip(run_ranks(start, tiles.len()))
        .all(|(tile, expected)| {
            tile.is_joker() || (tile.color() == anchor.color() && tile.rank() == expected)
        })
}

/// `len` consecutive ranks from `start`, with 13 followed by 1.
fn run_ranks(start: u8, len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| wrap_rank(i32::from(start) + i as i32))
        .collect()
}

/// Maps any integer onto the rank cycle 1..=13.
fn wrap_rank(rank: i32) -> u8 {
    let max = i32::from(MAX_RANK);
    ((rank - 1).rem_euclid(max) + 1) as u8
}
