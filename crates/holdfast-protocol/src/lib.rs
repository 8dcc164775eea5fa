//! Wire protocol for Holdfast.
//!
//! Everything that crosses the socket lives here:
//!
//! - **Identity** ([`PlayerId`], [`RoomId`]) and routing ([`Recipient`]).
//! - **Messages** ([`ClientMessage`], [`ServerMessage`]) wrapped in an
//!   [`Envelope`], plus the room views they carry ([`RoomSnapshot`],
//!   [`PlayerView`], [`Standing`], [`GameResult`]).
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) for bytes on the wire.
//! - **Errors** ([`ProtocolError`]) and client-facing [`ErrorCode`]s.
//!
//! The protocol layer knows nothing about rooms or timers. It only
//! describes the payload shapes the room engine produces and consumes.
//!
//! ```text
//! Transport (frames) → Protocol (Envelope) → Room engine (actions)
//! ```

mod codec;
mod error;
mod error_codes;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use error_codes::ErrorCode;
pub use types::{
    ClientMessage, Contender, Envelope, GameOverReason, GameResult, Phase,
    PlayerId, PlayerView, Recipient, RoomId, RoomSnapshot, ServerMessage,
    Standing,
};

/// Protocol version the server speaks. Clients announce theirs in
/// [`ClientMessage::Hello`] and are turned away on mismatch.
pub const PROTOCOL_VERSION: u32 = 1;
