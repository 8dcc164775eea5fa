//! Unified error type for the Holdfast server.

use holdfast_protocol::ProtocolError;
use holdfast_room::RoomError;
use holdfast_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates `From` impls, so
/// the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum HoldfastError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, handshake).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (config, membership, shutdown).
    #[error(transparent)]
    Room(#[from] RoomError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let err: HoldfastError = err.into();
        assert!(matches!(err, HoldfastError::Transport(_)));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err: HoldfastError = ProtocolError::InvalidMessage("bad".into()).into();
        assert!(matches!(err, HoldfastError::Protocol(_)));
    }

    #[test]
    fn test_from_room_error() {
        let err: HoldfastError = RoomError::NotFound(holdfast_protocol::RoomId(123_456)).into();
        assert!(matches!(err, HoldfastError::Room(_)));
        assert_eq!(err.to_string(), "room R-123456 not found");
    }
}
