//! Sparse tile container shared by the board and every rack.

use std::collections::HashMap;

use crate::rules::{BOARD_HEIGHT, BOARD_WIDTH, RACK_HEIGHT, RACK_WIDTH};
use crate::{Coordinate, Tile};

/// A fixed-size grid holding at most one tile per cell.
///
/// A missing key is an empty cell. Horizontal neighbours form "runs":
/// [`first_of_run`](Self::first_of_run) and
/// [`run_length`](Self::run_length) are the basis of both the set mover
/// and the consistency validator, so they must agree on what "left" and
/// "right" mean.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: i32,
    height: i32,
    tiles: HashMap<Coordinate, Tile>,
}

impl Grid {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            tiles: HashMap::new(),
        }
    }

    /// An empty 26×8 board.
    pub fn board() -> Self {
        Self::new(BOARD_WIDTH, BOARD_HEIGHT)
    }

    /// An empty 20×3 rack.
    pub fn rack() -> Self {
        Self::new(RACK_WIDTH, RACK_HEIGHT)
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Number of cells; a grid can never hold more tiles than this.
    pub fn capacity(&self) -> usize {
        (self.width * self.height) as usize
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity()
    }

    pub fn in_bounds(&self, coord: Coordinate) -> bool {
        (0..self.width).contains(&coord.col) && (0..self.height).contains(&coord.row)
    }

    pub fn get(&self, coord: Coordinate) -> Option<Tile> {
        self.tiles.get(&coord).copied()
    }

    pub fn contains(&self, coord: Coordinate) -> bool {
        self.tiles.contains_key(&coord)
    }

    /// Writes `tile` into `coord`, replacing whatever was there.
    ///
    /// `None` is a no-op: it never clears a cell. Use
    /// [`remove`](Self::remove) for that.
    pub fn set(&mut self, coord: Coordinate, tile: Option<Tile>) {
        if let Some(tile) = tile {
            self.tiles.insert(coord, tile);
        }
    }

    pub fn remove(&mut self, coord: Coordinate) -> Option<Tile> {
        self.tiles.remove(&coord)
    }

    pub fn clear(&mut self) {
        self.tiles.clear();
    }

    /// Removes every tile, returning them in no particular order.
    pub fn drain(&mut self) -> Vec<Tile> {
        self.tiles.drain().map(|(_, tile)| tile).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Coordinate, Tile)> + '_ {
        self.tiles.iter().map(|(coord, tile)| (*coord, *tile))
    }

    /// Occupied coordinates in row-major order.
    pub fn occupied(&self) -> Vec<Coordinate> {
        let mut coords: Vec<Coordinate> = self.tiles.keys().copied().collect();
        coords.sort_by_key(|c| (c.row, c.col));
        coords
    }

    /// First free cell in row-major order, or `None` if the grid is full.
    pub fn first_free(&self) -> Option<Coordinate> {
        (0..self.height)
            .flat_map(|row| (0..self.width).map(move |col| Coordinate::new(col, row)))
            .find(|coord| !self.contains(*coord))
    }

    /// Leftmost coordinate of the horizontal run containing `coord`.
    ///
    /// Walks left while the immediate left neighbour is occupied. `coord`
    /// itself does not need to be occupied.
    pub fn first_of_run(&self, coord: Coordinate) -> Coordinate {
        let mut first = coord;
        while self.contains(first.shifted(-1)) {
            first = first.shifted(-1);
        }
        first
    }

    /// Number of contiguous occupied cells from `coord` rightward,
    /// `coord` included.
    pub fn run_length(&self, coord: Coordinate) -> usize {
        let mut len = 0;
        while self.contains(coord.shifted(len as i32)) {
            len += 1;
        }
        len
    }

    /// Tiles of the run starting at `first`, left to right.
    pub fn run_tiles(&self, first: Coordinate, len: usize) -> Vec<Tile> {
        (0..len)
            .filter_map(|i| self.get(first.shifted(i as i32)))
            .collect()
    }

    /// Sum of the face values of all tiles (jokers count as 20).
    pub fn points(&self) -> i32 {
        self.tiles.values().map(Tile::points).sum()
    }

    /// Takes every tile off the grid, orders them with `compare`, and lays
    /// them back out row-major from `(0, 0)`.
    pub fn relayout_sorted_by<F>(&mut self, compare: F)
    where
        F: FnMut(&Tile, &Tile) -> std::cmp::Ordering,
    {
        let mut tiles = self.drain();
        tiles.sort_by(compare);
        let width = self.width;
        for (i, tile) in tiles.into_iter().enumerate() {
            let i = i as i32;
            self.tiles
                .insert(Coordinate::new(i % width, i / width), tile);
        }
    }
}
