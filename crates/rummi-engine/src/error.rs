//! Error types for the rules engine.
//!
//! The `Display` text of every variant is shown to players verbatim, so
//! it is written for them rather than for logs.

use crate::rules::{MIN_FIRST_MOVE_POINTS, MIN_PLAYERS};
use crate::{Coordinate, SeatId};

/// How an error should be treated by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request does not fit the current game state (wrong turn,
    /// not started, inconsistent board, empty bag, ...).
    StateConflict,
    /// The request names a cell that is taken, empty or off the grid.
    PlacementConflict,
}

/// Errors raised by [`Game`](crate::Game) operations.
///
/// A failed operation leaves the game exactly as it was, with one
/// documented exception: `draw` rolls back the current player's pending
/// moves before it checks anything else.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("The Game has not been initialized yet. Please wait for other Players to join.")]
    NotStarted,

    #[error("The Game has already started. Please wait for the other Players to finish their current game")]
    AlreadyStarted,

    #[error("You cannot make this move since its not your turn")]
    NotYourTurn,

    #[error("You cannot go on because the table configuration is not valid.")]
    TableInconsistent,

    #[error(
        "You need to put down stones at least {} worth of points to go on",
        MIN_FIRST_MOVE_POINTS
    )]
    NotEnoughPoints,

    #[error("You cannot draw another Stone from the Bag since its empty.")]
    BagEmpty,

    #[error("You cannot draw another Stone since your hand is full")]
    HandFull,

    #[error("You cannot join the game anymore. Wait for someone to leave.")]
    GameFull,

    #[error("There have to be at least {} players to start the game.", MIN_PLAYERS)]
    NotEnoughPlayers,

    #[error("Clients cannot start the game. Please wait for the host to start the game.")]
    NotHost,

    #[error("You cannot put down two stones at the same spot.")]
    SpotTaken,

    #[error("There is no stone at {0}.")]
    NoTileAt(Coordinate),

    #[error("The spot {0} is outside of the grid.")]
    OutOfBounds(Coordinate),

    #[error("{0} has not joined the game.")]
    UnknownPlayer(SeatId),
}

impl GameError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SpotTaken | Self::NoTileAt(_) | Self::OutOfBounds(_) => {
                ErrorKind::PlacementConflict
            }
            _ => ErrorKind::StateConflict,
        }
    }
}
