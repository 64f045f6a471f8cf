//! Codec trait and implementations for serializing messages.
//!
//! The protocol layer does not care how messages become bytes; it only
//! needs something that implements [`Codec`]. Framing (one message per
//! line) is the transport's job, so a codec must never emit a raw
//! newline.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes Rust values to bytes and decodes them back.
///
/// `Send + Sync + 'static` so a codec can live inside long-running
/// Tokio tasks.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or do
    /// not match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that writes compact JSON (via `serde_json`).
///
/// Compact output never contains a literal newline, so every encoded
/// message fits on one line of the stream.
///
/// ```rust
/// use rummi_protocol::{Codec, JsonCodec, Request};
///
/// let codec = JsonCodec;
/// let bytes = codec.encode(&Request::Join { name: "Ada".into(), age: 36 }).unwrap();
/// assert_eq!(bytes, br#"{"type":"JOIN","name":"Ada","age":36}"#);
///
/// let decoded: Request = codec.decode(&bytes).unwrap();
/// assert!(matches!(decoded, Request::Join { age: 36, .. }));
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
