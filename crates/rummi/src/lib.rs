//! # Rummi
//!
//! Networked Rummikub: one authoritative server, up to four clients.
//!
//! The server owns a single [`Game`](rummi_engine::Game) inside a session
//! actor. Every client request is applied to it in arrival order and the
//! resulting table, rack, bag and turn updates are fanned out to each
//! seat, rotated so that every client sees itself at position 0.
//!
//! ```text
//! RummiClient ─line─▶ handler ─▶ session actor ─▶ Dispatcher ─▶ Game
//!      ▲                                │
//!      └─────────line── writer task ◀───┘ (per-seat queue)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rummi::prelude::*;
//!
//! # async fn host() -> Result<(), RummiError> {
//! let server = RummiServer::builder().bind("0.0.0.0:48410").build().await?;
//! server.run().await
//! # }
//! ```

mod client;
mod dispatcher;
mod error;
mod handler;
mod seats;
mod server;
mod session;

pub use client::{Presenter, RummiClient, present};
pub use dispatcher::{Dispatcher, SET_MOVE_REJECTED};
pub use error::{RummiError, SessionError};
pub use seats::{SeatHandle, SeatSender, SeatTable};
pub use server::{DEFAULT_PORT, RummiServer, RummiServerBuilder, ServerConfig};
pub use session::{SessionHandle, spawn_session};

pub use rummi_engine as engine;
pub use rummi_protocol as protocol;
pub use rummi_transport as transport;

/// Convenience re-exports for the common case.
pub mod prelude {
    pub use crate::{
        Dispatcher, Presenter, RummiClient, RummiError, RummiServer, RummiServerBuilder,
        ServerConfig, SessionError, SessionHandle,
    };
    pub use rummi_engine::{Coordinate, Game, GameError, Grid, SeatId};
    pub use rummi_protocol::{GameInfo, RankEntry, Request};
}
