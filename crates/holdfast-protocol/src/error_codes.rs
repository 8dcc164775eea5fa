//! Client-facing error codes.
//!
//! Sent inside [`ServerMessage::Error`](crate::ServerMessage::Error) as
//! `SCREAMING_SNAKE_CASE` strings (e.g. `"NAME_TAKEN"`), so clients can
//! branch on them without parsing the human-readable message.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Why a request from the client was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Room creation
    InvalidConfig,

    // Joining
    RoomNotFound,
    NameTaken,
    RoomFull,
    PhaseNotJoinable,
    AlreadyInRoom,

    // Membership
    NotInRoom,

    // Protocol
    InvalidMessage,
    UnsupportedVersion,

    // Server
    ServiceUnavailable,
}

impl ErrorCode {
    /// Short human-readable explanation of the code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::InvalidConfig => {
                "Starting time must be 10-600 seconds and rounds 1-50."
            }
            Self::RoomNotFound => "No room exists with that code.",
            Self::NameTaken => "Another player in the room already uses that name.",
            Self::RoomFull => "The room already has the maximum number of players.",
            Self::PhaseNotJoinable => {
                "The room is mid-round. Try again once the round is over."
            }
            Self::AlreadyInRoom => "Leave your current room first.",
            Self::NotInRoom => "You are not in a room.",
            Self::InvalidMessage => "The message could not be understood.",
            Self::UnsupportedVersion => "Client protocol version is not supported.",
            Self::ServiceUnavailable => "The room is shutting down.",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InvalidConfig => "INVALID_CONFIG",
            Self::RoomNotFound => "ROOM_NOT_FOUND",
            Self::NameTaken => "NAME_TAKEN",
            Self::RoomFull => "ROOM_FULL",
            Self::PhaseNotJoinable => "PHASE_NOT_JOINABLE",
            Self::AlreadyInRoom => "ALREADY_IN_ROOM",
            Self::NotInRoom => "NOT_IN_ROOM",
            Self::InvalidMessage => "INVALID_MESSAGE",
            Self::UnsupportedVersion => "UNSUPPORTED_VERSION",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
        };
        f.write_str(s)
    }
}
