//! Rule constants shared by the engine and the server.

/// Number of seats at a table. Seat ids run from `0` to `MAX_PLAYERS - 1`.
pub const MAX_PLAYERS: usize = 4;

/// Fewest players that can keep a game running.
pub const MIN_PLAYERS: usize = 2;

/// Seat of the host. Only the host may start the game, and the session
/// ends when the host leaves.
pub const HOST_SEAT: u8 = 0;

/// Tiles dealt to every player at the start of a game.
pub const FIRST_TILES: usize = 14;

/// Points a player must put down with their first confirmed move.
pub const MIN_FIRST_MOVE_POINTS: i32 = 30;

/// Total number of tiles in a full draw pile.
pub const TILE_COUNT: usize = 106;

/// Copies of each color/rank combination in the pile.
pub const COPIES_PER_TILE: usize = 2;

/// Jokers in the pile.
pub const JOKER_COUNT: usize = 2;

/// Lowest and highest rank of a regular tile.
pub const MIN_RANK: u8 = 1;
pub const MAX_RANK: u8 = 13;

/// Value of a joker while it sits on a rack.
pub const JOKER_POINTS: u8 = 20;

/// Board dimensions.
pub const BOARD_WIDTH: i32 = 26;
pub const BOARD_HEIGHT: i32 = 8;

/// Rack dimensions.
pub const RACK_WIDTH: i32 = 20;
pub const RACK_HEIGHT: i32 = 3;

/// Shortest valid group or run.
pub const MIN_SET_SIZE: usize = 3;

/// Longest valid group (one tile per color).
pub const MAX_GROUP_SIZE: usize = 4;
