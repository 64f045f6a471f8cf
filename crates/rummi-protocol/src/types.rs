//! Message types that travel on the wire.
//!
//! Two closed catalogs: [`Request`] (client → server) and [`GameInfo`]
//! (server → client). Both are internally tagged, so every message is a
//! flat JSON object whose `type` field names the variant:
//!
//! ```text
//! {"type":"TABLE_MOVE","src_col":3,"src_row":0,"dst_col":5,"dst_row":2}
//! {"type":"BAG","size":78}
//! ```

use rummi_engine::rules::{MAX_RANK, MIN_RANK};
use rummi_engine::{Color, Coordinate, Grid, SeatId, Tile};
use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Recipient
// ---------------------------------------------------------------------------

/// Who should receive a server message.
///
/// The dispatcher returns `(Recipient, GameInfo)` pairs; the session
/// routes each one to the matching connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Every seated connection.
    All,
    /// One connection.
    Seat(SeatId),
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Source and destination cells of a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveCoords {
    pub src_col: i32,
    pub src_row: i32,
    pub dst_col: i32,
    pub dst_row: i32,
}

impl MoveCoords {
    pub fn new(src: Coordinate, dst: Coordinate) -> Self {
        Self {
            src_col: src.col,
            src_row: src.row,
            dst_col: dst.col,
            dst_row: dst.row,
        }
    }

    pub fn src(&self) -> Coordinate {
        Coordinate::new(self.src_col, self.src_row)
    }

    pub fn dst(&self) -> Coordinate {
        Coordinate::new(self.dst_col, self.dst_row)
    }
}

/// A client request. The sender is implied by the connection it arrives
/// on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    /// Host only: deal and begin.
    Start,
    /// Take the requester's seat under this name.
    Join { name: String, age: u32 },
    /// Single tile within the requester's rack.
    HandMove(MoveCoords),
    /// Single tile within the board.
    TableMove(MoveCoords),
    /// Single tile from rack to board.
    PutStone(MoveCoords),
    Draw,
    ConfirmMove,
    /// Roll back every move of the current turn.
    Reset,
    /// The requester's turn clock ran out.
    TimeOut,
    SortHandByGroup,
    SortHandByRun,
    /// Whole run within the board.
    TableSetMove(MoveCoords),
    /// Whole run within the requester's rack.
    HandSetMove(MoveCoords),
    /// Whole run from rack to board.
    PutSet(MoveCoords),
    /// Roll back the last move of the current turn.
    Undo,
    /// Ask for the player names again.
    UpdatePlayers,
}

impl Request {
    /// The wire tag, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::Join { .. } => "JOIN",
            Self::HandMove(_) => "HAND_MOVE",
            Self::TableMove(_) => "TABLE_MOVE",
            Self::PutStone(_) => "PUT_STONE",
            Self::Draw => "DRAW",
            Self::ConfirmMove => "CONFIRM_MOVE",
            Self::Reset => "RESET",
            Self::TimeOut => "TIME_OUT",
            Self::SortHandByGroup => "SORT_HAND_BY_GROUP",
            Self::SortHandByRun => "SORT_HAND_BY_RUN",
            Self::TableSetMove(_) => "TABLE_SET_MOVE",
            Self::HandSetMove(_) => "HAND_SET_MOVE",
            Self::PutSet(_) => "PUT_SET",
            Self::Undo => "UNDO",
            Self::UpdatePlayers => "UPDATE_PLAYERS",
        }
    }
}

// ---------------------------------------------------------------------------
// Grid payloads
// ---------------------------------------------------------------------------

/// One occupied cell of a grid payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileView {
    pub color: Color,
    pub rank: u8,
}

impl From<Tile> for TileView {
    fn from(tile: Tile) -> Self {
        Self {
            color: tile.color(),
            rank: tile.rank(),
        }
    }
}

impl From<TileView> for Tile {
    fn from(view: TileView) -> Self {
        Tile::new(view.color, view.rank)
    }
}

/// A dense snapshot of a board or rack, indexed `[col][row]`.
///
/// Serialized as a plain nested array, `null` for empty cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GridView(pub Vec<Vec<Option<TileView>>>);

impl GridView {
    pub fn from_grid(grid: &Grid) -> Self {
        let cells = (0..grid.width())
            .map(|col| {
                (0..grid.height())
                    .map(|row| grid.get(Coordinate::new(col, row)).map(TileView::from))
                    .collect()
            })
            .collect();
        Self(cells)
    }

    pub fn width(&self) -> usize {
        self.0.len()
    }

    pub fn height(&self) -> usize {
        self.0.first().map_or(0, Vec::len)
    }

    pub fn get(&self, coord: Coordinate) -> Option<TileView> {
        let col = usize::try_from(coord.col).ok()?;
        let row = usize::try_from(coord.row).ok()?;
        self.0.get(col)?.get(row).copied().flatten()
    }

    /// Number of occupied cells.
    pub fn tile_count(&self) -> usize {
        self.0.iter().flatten().filter(|cell| cell.is_some()).count()
    }

    /// Rebuilds a sparse grid from the payload.
    ///
    /// # Errors
    /// `ProtocolError::InvalidMessage` if the columns differ in height.
    pub fn to_grid(&self) -> Result<Grid, ProtocolError> {
        let height = self.height();
        if self.0.iter().any(|column| column.len() != height) {
            return Err(ProtocolError::InvalidMessage(
                "grid columns differ in height".into(),
            ));
        }
        let mut grid = Grid::new(self.width() as i32, height as i32);
        for (col, column) in self.0.iter().enumerate() {
            for (row, cell) in column.iter().enumerate() {
                if let Some(view) = cell {
                    let regular = (MIN_RANK..=MAX_RANK).contains(&view.rank);
                    if view.color != Color::Joker && !regular {
                        return Err(ProtocolError::InvalidMessage(format!(
                            "tile rank {} out of range",
                            view.rank
                        )));
                    }
                }
                grid.set(
                    Coordinate::new(col as i32, row as i32),
                    cell.map(Tile::from),
                );
            }
        }
        Ok(grid)
    }
}

// ---------------------------------------------------------------------------
// Game infos
// ---------------------------------------------------------------------------

/// One line of the final ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankEntry {
    pub name: String,
    pub score: i32,
}

/// A server message.
///
/// Lists that describe players (`HAND_SIZES`, `PLAYER_NAMES`) are
/// rotated per recipient so that index 0 is always the recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameInfo {
    Table { grid: GridView },
    Hand { grid: GridView },
    Bag { size: usize },
    HandSizes { sizes: Vec<usize> },
    PlayerNames { names: Vec<String> },
    /// Seats between the recipient and the current player, clockwise.
    ///
    /// Only occupied seats are counted, so the offset indexes the
    /// recipient's `PLAYER_NAMES` and `HAND_SIZES` lists directly. With
    /// players in seats 0, 1 and 3, seat 3 sees seat 0 at offset 1.
    CurrentPlayer { offset: usize },
    Error { message: String },
    YourTurn,
    GameStart,
    /// Best first.
    Rank { entries: Vec<RankEntry> },
    TooManyClients,
}

impl GameInfo {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// The wire tag, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Table { .. } => "TABLE",
            Self::Hand { .. } => "HAND",
            Self::Bag { .. } => "BAG",
            Self::HandSizes { .. } => "HAND_SIZES",
            Self::PlayerNames { .. } => "PLAYER_NAMES",
            Self::CurrentPlayer { .. } => "CURRENT_PLAYER",
            Self::Error { .. } => "ERROR",
            Self::YourTurn => "YOUR_TURN",
            Self::GameStart => "GAME_START",
            Self::Rank { .. } => "RANK",
            Self::TooManyClients => "TOO_MANY_CLIENTS",
        }
    }
}
