//! Error types for the room layer.

use holdfast_protocol::{ErrorCode, Phase, PlayerId, RoomId};

/// Errors that can occur during room operations.
///
/// Join rejections are reported to the requester only; none of these
/// are ever broadcast to a room.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// Creation parameters are out of range. Nothing was created.
    #[error("{field} must be between {min} and {max}, got {value}")]
    InvalidConfig {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },

    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// Someone in the room already uses this exact name.
    #[error("name {0:?} is already taken in this room")]
    NameTaken(String),

    /// All player slots are occupied.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// A countdown or bidding phase is running.
    #[error("room {0} cannot be joined during {1}")]
    PhaseNotJoinable(RoomId, Phase),

    /// The player already belongs to a room.
    #[error("player {0} is already in room {1}")]
    AlreadyInRoom(PlayerId, RoomId),

    /// The player is not in any room (or not in this one).
    #[error("player {0} is not in a room")]
    NotInRoom(PlayerId),

    /// The room's command channel is closed; the room is shutting down.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),
}

impl RoomError {
    /// The wire code reported to the client for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidConfig { .. } => ErrorCode::InvalidConfig,
            Self::NotFound(_) => ErrorCode::RoomNotFound,
            Self::NameTaken(_) => ErrorCode::NameTaken,
            Self::RoomFull(_) => ErrorCode::RoomFull,
            Self::PhaseNotJoinable(..) => ErrorCode::PhaseNotJoinable,
            Self::AlreadyInRoom(..) => ErrorCode::AlreadyInRoom,
            Self::NotInRoom(_) => ErrorCode::NotInRoom,
            Self::Unavailable(_) => ErrorCode::ServiceUnavailable,
        }
    }
}
