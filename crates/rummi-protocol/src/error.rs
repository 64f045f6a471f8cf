//! Error types for the protocol layer.
//!
//! A `ProtocolError` always means a message could not be turned into
//! bytes or back, never that the connection or the game failed.

/// Errors that can occur while encoding or decoding messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, an unknown `type` tag,
    /// missing fields or wrong field types.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message decoded but does not make sense, e.g. a grid payload
    /// whose columns have different heights.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
