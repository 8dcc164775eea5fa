//! Error types for the protocol layer.

/// Errors raised while turning messages into bytes or back.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// A value could not be serialized.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Incoming bytes were not a valid message: malformed JSON, an
    /// unknown `type` tag, or missing fields.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message decoded but breaks a protocol rule, e.g. a game
    /// action sent before `Hello`.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
