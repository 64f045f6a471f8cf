//! Error types for the server and client.

use rummi_engine::GameError;
use rummi_protocol::ProtocolError;
use rummi_transport::TransportError;

/// Errors raised by the session actor and its handle.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// All four seats are taken.
    #[error("all {0} seats are taken")]
    TooManyClients(usize),

    /// The session actor has stopped, usually because the game was torn
    /// down.
    #[error("session is no longer running")]
    Unavailable,
}

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert layer errors
/// automatically.
#[derive(Debug, thiserror::Error)]
pub enum RummiError {
    /// A transport-level error (bind, connect, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, bad grid payload).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (seat table full, session gone).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A rules error surfaced outside the dispatcher.
    #[error(transparent)]
    Game(#[from] GameError),
}
