//! Codec trait and the JSON implementation.
//!
//! The gateway never touches `serde_json` directly; it goes through a
//! [`Codec`] so the wire format can change without touching the handler.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Encodes values to bytes and decodes bytes back.
///
/// `Send + Sync + 'static` because a single codec instance is shared by
/// every connection task on the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into a frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value cannot be represented.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes a frame into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` for malformed or mismatched input.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

/// A [`Codec`] backed by `serde_json`.
///
/// JSON keeps browser clients trivial: frames are sent as text and can
/// be read straight from DevTools.
///
/// ```rust
/// use holdfast_protocol::{ClientMessage, Codec, Envelope, JsonCodec};
///
/// let codec = JsonCodec;
/// let envelope = Envelope {
///     seq: 3,
///     timestamp: 1200,
///     payload: ClientMessage::Hold,
/// };
///
/// let bytes = codec.encode(&envelope).unwrap();
/// let decoded: Envelope<ClientMessage> = codec.decode(&bytes).unwrap();
/// assert_eq!(envelope, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
