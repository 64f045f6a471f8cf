//! The draw pile ("bag") players draw tiles from.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::rules::{COPIES_PER_TILE, JOKER_COUNT, MAX_RANK, MIN_RANK, TILE_COUNT};
use crate::{Color, GameError, Tile};

/// An unordered bag of tiles with uniformly random removal.
#[derive(Debug, Clone)]
pub struct DrawPile {
    tiles: Vec<Tile>,
    rng: StdRng,
}

impl DrawPile {
    /// An empty pile seeded from the OS.
    pub fn empty() -> Self {
        Self {
            tiles: Vec::new(),
            rng: StdRng::from_os_rng(),
        }
    }

    /// A complete set of 106 tiles seeded from the OS.
    pub fn full() -> Self {
        let mut pile = Self::empty();
        pile.refill();
        pile
    }

    /// A complete set of 106 tiles with a deterministic draw order.
    pub fn with_seed(seed: u64) -> Self {
        let mut pile = Self {
            tiles: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
        };
        pile.refill();
        pile
    }

    /// Discards the current content and puts every tile of a fresh set
    /// back in, keeping the random generator.
    pub fn refill(&mut self) {
        self.tiles.clear();
        self.tiles.reserve(TILE_COUNT);
        for color in Color::REGULAR {
            for rank in MIN_RANK..=MAX_RANK {
                for _ in 0..COPIES_PER_TILE {
                    self.tiles.push(Tile::new(color, rank));
                }
            }
        }
        self.tiles
            .extend(std::iter::repeat_n(Tile::joker(), JOKER_COUNT));
    }

    /// Removes and returns a uniformly random tile.
    ///
    /// # Errors
    /// Returns [`GameError::BagEmpty`] if there is nothing left to draw.
    pub fn draw(&mut self) -> Result<Tile, GameError> {
        if self.tiles.is_empty() {
            return Err(GameError::BagEmpty);
        }
        let index = self.rng.random_range(0..self.tiles.len());
        // Order inside the bag carries no meaning.
        Ok(self.tiles.swap_remove(index))
    }

    /// Puts tiles back, e.g. the rack of a player who left.
    pub fn add_tiles(&mut self, tiles: impl IntoIterator<Item = Tile>) {
        self.tiles.extend(tiles);
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

impl Default for DrawPile {
    fn default() -> Self {
        Self::empty()
    }
}
