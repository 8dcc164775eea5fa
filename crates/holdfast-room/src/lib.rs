//! Rooms for the Holdfast "hold the button" game.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns its
//! players, its round state machine, and its timers. Player actions and
//! timer fires for one room are handled strictly one after another on
//! that task; rooms never share state.
//!
//! # Key types
//!
//! - [`RoundEngine`] — the per-room state machine (arming, countdown,
//!   bidding, resolution, game over). Pure: it returns an [`Outcome`]
//!   of messages and timer commands instead of doing I/O.
//! - [`Room`] / [`Player`] — the data the engine operates on
//! - [`RoomManager`] — the registry: creates rooms, routes players,
//!   drops rooms once they empty
//! - [`RoomHandle`] — send commands to a running room actor
//! - [`RoomConfig`] — per-room settings (starting time, round count)

mod actor;
mod config;
mod engine;
mod error;
mod manager;
mod player;
mod room;

pub use actor::{Departure, PlayerAction, PlayerSender, RoomHandle, RoomInfo};
pub use config::{
    MAX_INITIAL_TIME, MAX_PLAYERS, MAX_ROUNDS, MIN_INITIAL_TIME, MIN_ROUNDS,
    RoomConfig, RoundTiming, TIMING,
};
pub use engine::{
    Input, Outcome, RoundEngine, TimerCommand, arming_satisfied,
    final_standings, round_winners,
};
pub use error::RoomError;
pub use manager::RoomManager;
pub use player::Player;
pub use room::{PhaseTimerKind, Room};
