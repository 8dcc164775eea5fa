//! The data a room's round engine operates on.

use holdfast_protocol::{GameOverReason, Phase, PlayerId, RoomId, RoomSnapshot};
use holdfast_timer::TimerToken;

use crate::{Player, RoomConfig};

/// Which repeating timer is driving the current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseTimerKind {
    /// Ticks the pre-round countdown down to zero.
    Countdown,
    /// Counts seconds of bidding.
    Bidding,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct PhaseTimer {
    pub kind: PhaseTimerKind,
    pub token: TimerToken,
}

/// A one-shot transition waiting for its delay to pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DelayedAction {
    StartNextRound,
    /// Re-arm the countdown if the remaining holders still qualify.
    RecheckArming,
    /// Nobody is holding: reset the round and wait again.
    FoldBack,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct PendingDelay {
    pub token: TimerToken,
    pub action: DelayedAction,
    /// Phase the room was in when the delay was scheduled. If the room
    /// has moved on by the time it fires, the delay does nothing.
    pub expected_phase: Phase,
}

/// One game room.
///
/// Players are kept in join order, which is the order snapshots list
/// them in and the order ties are reported in.
#[derive(Debug)]
pub struct Room {
    pub(crate) id: RoomId,
    pub(crate) config: RoomConfig,
    pub(crate) players: Vec<Player>,
    pub(crate) current_round: u32,
    pub(crate) phase: Phase,
    pub(crate) pre_round_countdown: u32,
    pub(crate) round_elapsed_time: u32,
    /// Players who entered the current bidding phase.
    pub(crate) active_players: Vec<PlayerId>,
    pub(crate) game_over_reason: Option<GameOverReason>,
    pub(crate) phase_timer: Option<PhaseTimer>,
    pub(crate) delay: Option<PendingDelay>,
}

impl Room {
    pub(crate) fn new(id: RoomId, config: RoomConfig) -> Self {
        Self {
            id,
            config,
            players: Vec::new(),
            current_round: 0,
            phase: Phase::Waiting,
            pre_round_countdown: 0,
            round_elapsed_time: 0,
            active_players: Vec::new(),
            game_over_reason: None,
            phase_timer: None,
            delay: None,
        }
    }

    pub fn id(&self) -> RoomId {
        self.id
    }

    pub fn config(&self) -> RoomConfig {
        self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub(crate) fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn pre_round_countdown(&self) -> u32 {
        self.pre_round_countdown
    }

    pub fn round_elapsed_time(&self) -> u32 {
        self.round_elapsed_time
    }

    pub fn active_players(&self) -> &[PlayerId] {
        &self.active_players
    }

    /// Why the game ended, once it has.
    pub fn game_over_reason(&self) -> Option<GameOverReason> {
        self.game_over_reason
    }

    /// Players not yet eliminated.
    pub fn alive_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_alive()).count()
    }

    /// The repeating timer currently live, if any.
    pub fn live_phase_timer(&self) -> Option<PhaseTimerKind> {
        self.phase_timer.map(|t| t.kind)
    }

    pub fn has_pending_delay(&self) -> bool {
        self.delay.is_some()
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            room_id: self.id,
            players: self.players.iter().map(Player::view).collect(),
            current_round: self.current_round,
            max_rounds: self.config.max_rounds,
            phase: self.phase,
        }
    }
}
