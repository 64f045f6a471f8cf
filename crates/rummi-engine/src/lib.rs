//! Rules engine for networked Rummikub.
//!
//! Everything here is synchronous and free of I/O: the server wraps a
//! [`Game`] in a single task and feeds it requests one at a time.
//!
//! # Key types
//!
//! - [`Game`]: the aggregate root; every player-facing operation
//! - [`Grid`]: sparse tile container used for the board and each rack
//! - [`DrawPile`]: the bag of 106 tiles
//! - [`GameError`]: what can go wrong, with player-facing messages
//!
//! The [`validator`] and [`mover`] modules hold the two shared
//! algorithms: board consistency checking and whole-run relocation.

mod error;
mod game;
mod grid;
mod pile;
mod player;
mod tile;

pub mod mover;
pub mod rules;
pub mod validator;

pub use error::{ErrorKind, GameError};
pub use game::{Game, GamePhase, Trace, TraceKind};
pub use grid::Grid;
pub use mover::{SetMove, plan_set_move};
pub use pile::DrawPile;
pub use player::{Player, SeatId};
pub use tile::{Color, Coordinate, Tile};
pub use validator::{Meld, SetKind};
