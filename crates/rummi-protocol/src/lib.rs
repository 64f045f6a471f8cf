//! Wire protocol for Rummi.
//!
//! This crate defines what clients and servers say to each other:
//!
//! - **Types** ([`Request`], [`GameInfo`], [`GridView`], [`Recipient`]):
//!   the two message catalogs and their payloads.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how messages become
//!   bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! It knows nothing about sockets or seats; framing is the transport's
//! job and routing is the session's.
//!
//! ```text
//! Transport (lines) → Protocol (Request / GameInfo) → Session (seats)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{GameInfo, GridView, MoveCoords, RankEntry, Recipient, Request, TileView};
