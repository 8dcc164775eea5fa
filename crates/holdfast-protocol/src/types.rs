//! Message types that travel on the wire.
//!
//! Client → server traffic is a [`ClientMessage`], server → client traffic
//! is a [`ServerMessage`]; both are wrapped in an [`Envelope`]. Messages
//! are internally tagged (`{"type": "Hold"}`) which keeps the browser
//! client a plain `switch` on `msg.type`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ErrorCode;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Identifies a connected player. One connection is one player, so this
/// is the connection handle assigned by the gateway.
///
/// Serialized as a plain number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// Identifies a room. Room codes are six-digit numbers players type in
/// to join each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u32);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{:06}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Recipient
// ---------------------------------------------------------------------------

/// Who in a room should receive a server message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every occupant of the room.
    All,
    /// One occupant only (join replies, phase replay).
    Player(PlayerId),
    /// Every occupant except one.
    AllExcept(PlayerId),
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Where a room is in its round lifecycle.
///
/// ```text
///             arm                 countdown ends
/// Waiting ──────────→ PreCountdown ──────────────→ InRound
///    ↑  ↖ interrupted /                               │ everyone let go
///    │                                                ▼
///    └────────── next round ───────────────────── RoundEnded
///                                                     │ out of rounds / players
///                                                     ▼
///                                                  GameOver
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Waiting,
    PreCountdown,
    InRound,
    RoundEnded,
    GameOver,
}

impl Phase {
    /// Returns `true` if new players may join in this phase.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Waiting | Self::RoundEnded | Self::GameOver)
    }

    /// Returns `true` while a countdown or bidding phase is running.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::PreCountdown | Self::InRound)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "Waiting"),
            Self::PreCountdown => write!(f, "PreCountdown"),
            Self::InRound => write!(f, "InRound"),
            Self::RoundEnded => write!(f, "RoundEnded"),
            Self::GameOver => write!(f, "GameOver"),
        }
    }
}

// ---------------------------------------------------------------------------
// Room views
// ---------------------------------------------------------------------------

/// One player's row in a status snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub player_id: PlayerId,
    pub name: String,
    pub time_budget: u32,
    pub tokens: u32,
    pub is_holding: bool,
    pub has_opted_out: bool,
    pub round_hold_duration: u32,
    pub is_eliminated: bool,
}

/// Full room status, broadcast after every state-affecting action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub room_id: RoomId,
    pub players: Vec<PlayerView>,
    pub current_round: u32,
    pub max_rounds: u32,
    pub phase: Phase,
}

/// A player named in a round or game result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contender {
    pub player_id: PlayerId,
    pub name: String,
}

/// One line of the final standings.
///
/// `rank` is `None` for eliminated players: they are listed for
/// transparency but never ranked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    pub rank: Option<u32>,
    pub player_id: PlayerId,
    pub name: String,
    pub tokens: u32,
    pub time_budget: u32,
    pub is_eliminated: bool,
}

/// Who won the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum GameResult {
    Winner(Contender),
    /// Several players share both the top token count and remaining time.
    Tie { players: Vec<Contender> },
    /// Nobody is left standing.
    NoWinner,
}

/// Why the game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOverReason {
    SoleSurvivor,
    AllEliminated,
    RoundsExhausted,
    InsufficientPlayers,
}

impl fmt::Display for GameOverReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SoleSurvivor => write!(f, "sole survivor"),
            Self::AllEliminated => write!(f, "all eliminated"),
            Self::RoundsExhausted => write!(f, "rounds exhausted"),
            Self::InsufficientPlayers => write!(f, "insufficient players"),
        }
    }
}

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// Everything a client can ask of the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// First message on every connection.
    Hello { version: u32 },

    /// Open a new room with this player as its first occupant.
    /// `initial_time` is each player's starting budget in seconds.
    CreateRoom {
        name: String,
        initial_time: u32,
        max_rounds: u32,
    },

    /// Join an existing room by code.
    JoinRoom { room_id: RoomId, name: String },

    LeaveRoom,

    /// The player pressed the button.
    Hold,

    /// The player let go of the button.
    Release,

    /// Keep-alive; echoed back as `HeartbeatAck`.
    Heartbeat { client_time: u64 },

    /// The client is closing the connection.
    Goodbye { reason: String },
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// Everything the server sends. Room broadcasts and direct replies share
/// one enum so a client only has one stream to decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    // -- Connection --
    Welcome {
        player_id: PlayerId,
        server_time: u64,
    },
    HeartbeatAck {
        client_time: u64,
        server_time: u64,
    },
    Error {
        code: ErrorCode,
        message: String,
    },

    // -- Membership --
    RoomJoined {
        room_id: RoomId,
        player_id: PlayerId,
    },
    RoomLeft {
        room_id: RoomId,
    },

    // -- Room broadcasts --
    /// Full status snapshot.
    RoomStatus(RoomSnapshot),

    /// Free-text status line for the room's message log.
    Notice { text: String },

    /// A new round is waiting for players to hold.
    RoundStarted { round: u32, max_rounds: u32 },

    /// Seconds left before bidding opens.
    CountdownTick { remaining: u32 },

    /// A countdown was cancelled because someone let go.
    CountdownInterrupted { by: String },

    /// Bidding has opened for these players.
    BiddingStarted {
        round: u32,
        contenders: Vec<Contender>,
    },

    /// Seconds elapsed in the bidding phase.
    BiddingElapsed { elapsed: u32 },

    /// A player held until their whole budget was spent.
    BudgetExhausted {
        player_id: PlayerId,
        name: String,
        held: u32,
    },

    /// The round was won. `tie` is set when several players shared the
    /// longest hold; each of them gets a token.
    RoundWon {
        round: u32,
        winners: Vec<Contender>,
        duration: u32,
        tie: bool,
    },

    /// The round ended with nobody holding for even a second, or nobody
    /// contesting at all.
    RoundUnclaimed { round: u32 },

    /// Advisory: clients may show a stats panel. No state effect.
    StatsPrompt { round: u32 },

    GameOver {
        standings: Vec<Standing>,
        result: GameResult,
        reason: GameOverReason,
    },
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Wrapper around every frame.
///
/// `seq` is per-connection and per-direction; `timestamp` is milliseconds
/// since the sender started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub seq: u64,
    pub timestamp: u64,
    pub payload: T,
}

#[cfg(test)]
mod tests {
    //! The browser client switches on these exact JSON shapes, so the
    //! tests pin them down.

    use super::*;

    fn sample_snapshot() -> RoomSnapshot {
        RoomSnapshot {
            room_id: RoomId(42),
            players: vec![PlayerView {
                player_id: PlayerId(1),
                name: "ada".into(),
                time_budget: 60,
                tokens: 0,
                is_holding: true,
                has_opted_out: false,
                round_hold_duration: 0,
                is_eliminated: false,
            }],
            current_round: 1,
            max_rounds: 3,
            phase: Phase::Waiting,
        }
    }

    #[test]
    fn test_player_id_serializes_as_plain_number() {
        assert_eq!(serde_json::to_string(&PlayerId(42)).unwrap(), "42");
    }

    #[test]
    fn test_room_id_display_is_zero_padded() {
        assert_eq!(RoomId(42).to_string(), "R-000042");
        assert_eq!(RoomId(123456).to_string(), "R-123456");
    }

    #[test]
    fn test_phase_joinable_and_active() {
        assert!(Phase::Waiting.is_joinable());
        assert!(Phase::RoundEnded.is_joinable());
        assert!(Phase::GameOver.is_joinable());
        assert!(!Phase::PreCountdown.is_joinable());
        assert!(!Phase::InRound.is_joinable());

        assert!(Phase::PreCountdown.is_active());
        assert!(Phase::InRound.is_active());
        assert!(!Phase::Waiting.is_active());
        assert!(!Phase::GameOver.is_active());
    }

    #[test]
    fn test_client_unit_variant_json_format() {
        let json = serde_json::to_value(&ClientMessage::Hold).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "Hold" }));
    }

    #[test]
    fn test_create_room_json_format() {
        let json = r#"{"type":"CreateRoom","name":"ada","initial_time":60,"max_rounds":3}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert_eq!(
            msg,
            ClientMessage::CreateRoom {
                name: "ada".into(),
                initial_time: 60,
                max_rounds: 3,
            }
        );
    }

    #[test]
    fn test_join_room_takes_plain_room_code() {
        let json = r#"{"type":"JoinRoom","room_id":123456,"name":"bo"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert_eq!(
            msg,
            ClientMessage::JoinRoom {
                room_id: RoomId(123456),
                name: "bo".into(),
            }
        );
    }

    #[test]
    fn test_room_status_flattens_snapshot_fields() {
        let msg = ServerMessage::RoomStatus(sample_snapshot());
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "RoomStatus");
        assert_eq!(json["phase"], "Waiting");
        assert_eq!(json["current_round"], 1);
        assert_eq!(json["players"][0]["name"], "ada");
    }

    #[test]
    fn test_error_carries_code_string() {
        let msg = ServerMessage::Error {
            code: ErrorCode::RoomFull,
            message: "room R-000001 is full".into(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "Error");
        assert_eq!(json["code"], "ROOM_FULL");
    }

    #[test]
    fn test_game_over_json_format() {
        let msg = ServerMessage::GameOver {
            standings: vec![Standing {
                rank: Some(1),
                player_id: PlayerId(1),
                name: "ada".into(),
                tokens: 2,
                time_budget: 31,
                is_eliminated: false,
            }],
            result: GameResult::Winner(Contender {
                player_id: PlayerId(1),
                name: "ada".into(),
            }),
            reason: GameOverReason::RoundsExhausted,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["reason"], "rounds_exhausted");
        assert_eq!(json["result"]["kind"], "Winner");
        assert_eq!(json["result"]["name"], "ada");
        assert_eq!(json["standings"][0]["rank"], 1);
    }

    #[test]
    fn test_tie_result_lists_players() {
        let result = GameResult::Tie {
            players: vec![
                Contender { player_id: PlayerId(1), name: "ada".into() },
                Contender { player_id: PlayerId(2), name: "bo".into() },
            ],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["kind"], "Tie");
        assert_eq!(json["players"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_game_over_reason_display() {
        assert_eq!(GameOverReason::SoleSurvivor.to_string(), "sole survivor");
        assert_eq!(
            GameOverReason::InsufficientPlayers.to_string(),
            "insufficient players"
        );
    }

    #[test]
    fn test_envelope_round_trip() {
        let envelope = Envelope {
            seq: 9,
            timestamp: 15_000,
            payload: ServerMessage::RoomStatus(sample_snapshot()),
        };
        let bytes = serde_json::to_vec(&envelope).unwrap();
        let decoded: Envelope<ServerMessage> =
            serde_json::from_slice(&bytes).unwrap();
        assert_eq!(envelope, decoded);
    }

    #[test]
    fn test_decode_unknown_type_returns_error() {
        let unknown = r#"{"type": "Teleport", "to": 3}"#;
        let result: Result<ClientMessage, _> = serde_json::from_str(unknown);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_envelope_missing_payload_returns_error() {
        let wrong = r#"{"seq": 1, "timestamp": 0}"#;
        let result: Result<Envelope<ClientMessage>, _> =
            serde_json::from_str(wrong);
        assert!(result.is_err());
    }
}
