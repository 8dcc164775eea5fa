//! The round state machine.
//!
//! A [`RoundEngine`] owns one [`Room`] and moves it through its phases:
//!
//! ```text
//! Waiting ──all alive hold──▶ PreCountdown ──5 ticks──▶ InRound
//!    ▲                           │ release                 │ everyone let go
//!    │◀── fold back / re-arm ────┘                         ▼
//!    │◀──────────── next round (after a delay) ──────── RoundEnded
//!    └── game-over checks ──────────────────────────────▶ GameOver
//! ```
//!
//! The engine does no I/O and never sleeps. Every input goes through
//! [`RoundEngine::advance`], which returns an [`Outcome`]: messages to
//! deliver and timer commands for the room actor to carry out. Timer
//! fires come back in as [`Input::TimerFired`] carrying the token the
//! engine handed out; a token the engine no longer holds is ignored.

use std::time::Duration;

use holdfast_protocol::{
    Contender, GameOverReason, GameResult, Phase, PlayerId, Recipient,
    RoomId, ServerMessage, Standing,
};
use holdfast_timer::{Schedule, TimerToken, TokenSource};

use crate::config::{MAX_PLAYERS, TIMING};
use crate::room::{DelayedAction, PendingDelay, PhaseTimer, PhaseTimerKind};
use crate::{Player, Room, RoomConfig, RoomError};


// ---------------------------------------------------------------------------
// Inputs and outputs
// ---------------------------------------------------------------------------

/// Something that happened to a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Hold(PlayerId),
    Release(PlayerId),
    /// The player left or disconnected.
    Depart(PlayerId),
    TimerFired(TimerToken),
}

/// A timer change the room actor must carry out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    Start { token: TimerToken, schedule: Schedule },
    Cancel(TimerToken),
}

/// Everything one input produced.
#[derive(Debug, Default)]
pub struct Outcome {
    /// Messages in the order they must be delivered.
    pub messages: Vec<(Recipient, ServerMessage)>,
    pub timers: Vec<TimerCommand>,
    /// The last player left; the room should be dropped.
    pub room_closed: bool,
}

impl Outcome {
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.timers.is_empty() && !self.room_closed
    }

    fn broadcast(&mut self, msg: ServerMessage) {
        self.messages.push((Recipient::All, msg));
    }

    fn send_to(&mut self, player_id: PlayerId, msg: ServerMessage) {
        self.messages.push((Recipient::Player(player_id), msg));
    }
}

fn notice(text: impl Into<String>) -> ServerMessage {
    ServerMessage::Notice { text: text.into() }
}

// ---------------------------------------------------------------------------
// Pure rules
// ---------------------------------------------------------------------------

/// Whether a set of candidates can arm the countdown: there is at least
/// one, and every one of them is holding.
pub fn arming_satisfied<'a>(candidates: impl IntoIterator<Item = &'a Player>) -> bool {
    let mut any = false;
    for player in candidates {
        if !player.is_holding {
            return false;
        }
        any = true;
    }
    any
}

/// Picks the winners of a round from `(player, seconds held)` pairs.
///
/// Everyone tied on the longest hold wins. Returns `None` when the
/// longest hold is zero seconds or there are no candidates.
pub fn round_winners(candidates: &[(PlayerId, u32)]) -> Option<(Vec<PlayerId>, u32)> {
    let longest = candidates.iter().map(|(_, held)| *held).max()?;
    if longest == 0 {
        return None;
    }
    let winners = candidates
        .iter()
        .filter(|(_, held)| *held == longest)
        .map(|(id, _)| *id)
        .collect();
    Some((winners, longest))
}

/// Final standings and overall result.
///
/// Surviving players rank first, by tokens then remaining time, both
/// descending; players equal on both share a rank. Eliminated players
/// follow, unranked.
pub fn final_standings(players: &[Player]) -> (Vec<Standing>, GameResult) {
    fn key(p: &Player) -> (u32, u32) {
        (p.tokens, p.time_budget)
    }

    let mut ranked: Vec<&Player> = players.iter().filter(|p| p.is_alive()).collect();
    ranked.sort_by(|a, b| key(b).cmp(&key(a)));

    let mut standings = Vec::with_capacity(players.len());
    let mut rank = 0;
    let mut previous = None;
    for (i, player) in ranked.iter().enumerate() {
        if previous != Some(key(player)) {
            rank = i as u32 + 1;
            previous = Some(key(player));
        }
        standings.push(player.standing(Some(rank)));
    }

    let mut eliminated: Vec<&Player> = players.iter().filter(|p| !p.is_alive()).collect();
    eliminated.sort_by(|a, b| b.tokens.cmp(&a.tokens));
    standings.extend(eliminated.iter().map(|p| p.standing(None)));

    let result = match ranked.first() {
        None => GameResult::NoWinner,
        Some(top) => {
            let leaders: Vec<Contender> = ranked
                .iter()
                .take_while(|p| key(p) == key(top))
                .map(|p| p.contender())
                .collect();
            if leaders.len() == 1 {
                GameResult::Winner(top.contender())
            } else {
                GameResult::Tie { players: leaders }
            }
        }
    };

    (standings, result)
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Drives one room through its rounds.
#[derive(Debug)]
pub struct RoundEngine {
    room: Room,
    tokens: TokenSource,
}

impl RoundEngine {
    /// Creates a room with `founder` as its first player and opens
    /// round 1.
    ///
    /// # Errors
    /// [`RoomError::InvalidConfig`] if either setting is out of range.
    pub fn create(
        room_id: RoomId,
        config: RoomConfig,
        founder: PlayerId,
        name: impl Into<String>,
    ) -> Result<(Self, Outcome), RoomError> {
        config.validate()?;
        let mut engine = Self {
            room: Room::new(room_id, config),
            tokens: TokenSource::new(),
        };
        let mut out = engine.join(founder, name)?;
        tracing::info!(
            %room_id,
            %founder,
            initial_time = config.initial_time,
            max_rounds = config.max_rounds,
            "room created"
        );
        engine.start_next_round(&mut out);
        Ok((engine, out))
    }

    pub fn room(&self) -> &Room {
        &self.room
    }

    pub fn snapshot(&self) -> holdfast_protocol::RoomSnapshot {
        self.room.snapshot()
    }

    /// Adds a player. Rejections change nothing.
    ///
    /// # Errors
    /// - [`RoomError::PhaseNotJoinable`] during a countdown or bidding
    /// - [`RoomError::AlreadyInRoom`] if the id is already present
    /// - [`RoomError::RoomFull`] at capacity
    /// - [`RoomError::NameTaken`] if the exact name is in use
    pub fn join(
        &mut self,
        player_id: PlayerId,
        name: impl Into<String>,
    ) -> Result<Outcome, RoomError> {
        let name = name.into();
        let room_id = self.room.id;

        if !self.room.phase.is_joinable() {
            return Err(RoomError::PhaseNotJoinable(room_id, self.room.phase));
        }
        if self.room.player(player_id).is_some() {
            return Err(RoomError::AlreadyInRoom(player_id, room_id));
        }
        if self.room.players.len() >= MAX_PLAYERS {
            return Err(RoomError::RoomFull(room_id));
        }
        if self.room.players.iter().any(|p| p.name == name) {
            return Err(RoomError::NameTaken(name));
        }

        self.room
            .players
            .push(Player::new(player_id, name.clone(), self.room.config.initial_time));
        tracing::info!(
            %room_id,
            %player_id,
            %name,
            players = self.room.players.len(),
            "player joined"
        );

        let mut out = Outcome::default();
        out.send_to(player_id, ServerMessage::RoomJoined { room_id, player_id });
        out.broadcast(notice(format!("{name} joined the room.")));
        self.broadcast_status(&mut out);
        self.replay_phase(player_id, &mut out);
        Ok(out)
    }

    /// Applies one input and returns what it produced.
    pub fn advance(&mut self, input: Input) -> Outcome {
        let mut out = Outcome::default();
        match input {
            Input::Hold(player_id) => self.hold(player_id, &mut out),
            Input::Release(player_id) => self.release(player_id, &mut out),
            Input::Depart(player_id) => self.depart(player_id, &mut out),
            Input::TimerFired(token) => self.timer_fired(token, &mut out),
        }
        out
    }

    // -- Player actions ----------------------------------------------------

    fn hold(&mut self, player_id: PlayerId, out: &mut Outcome) {
        let room_id = self.room.id;
        let phase = self.room.phase;
        let Some(player) = self.room.player_mut(player_id) else {
            tracing::debug!(%room_id, %player_id, "hold from non-member, ignoring");
            return;
        };
        if player.is_eliminated || player.time_budget == 0 {
            tracing::debug!(%room_id, %player_id, "hold from eliminated player, ignoring");
            return;
        }
        if player.is_holding || matches!(phase, Phase::InRound | Phase::GameOver) {
            return;
        }

        player.is_holding = true;
        tracing::trace!(%room_id, %player_id, %phase, "hold");
        self.broadcast_status(out);
        if phase == Phase::Waiting {
            self.try_arm(out);
        }
    }

    fn release(&mut self, player_id: PlayerId, out: &mut Outcome) {
        let room_id = self.room.id;
        let phase = self.room.phase;
        let countdown_live = self.room.live_phase_timer() == Some(PhaseTimerKind::Countdown);
        let Some(player) = self.room.player_mut(player_id) else {
            tracing::debug!(%room_id, %player_id, "release from non-member, ignoring");
            return;
        };
        if !player.is_holding {
            return;
        }

        match phase {
            Phase::PreCountdown if countdown_live => {
                let name = player.name.clone();
                self.interrupt_countdown(Some(player_id), name, out);
            }
            Phase::InRound => {
                player.is_holding = false;
                tracing::debug!(
                    %room_id,
                    %player_id,
                    held = player.round_hold_duration,
                    "released"
                );
                self.broadcast_status(out);
                self.check_release(out);
            }
            _ => {
                player.is_holding = false;
                self.broadcast_status(out);
            }
        }
    }

    fn depart(&mut self, player_id: PlayerId, out: &mut Outcome) {
        let room_id = self.room.id;
        let Some(index) = self.room.players.iter().position(|p| p.id == player_id) else {
            tracing::debug!(%room_id, %player_id, "departure of non-member, ignoring");
            return;
        };
        let phase = self.room.phase;
        let countdown_live = self.room.live_phase_timer() == Some(PhaseTimerKind::Countdown);
        let alive_before = self.room.alive_count();
        let departed = self.room.players.remove(index);
        tracing::info!(
            %room_id,
            %player_id,
            players = self.room.players.len(),
            "player left"
        );

        if self.room.players.is_empty() {
            self.cancel_all_timers(out);
            out.room_closed = true;
            tracing::info!(%room_id, "room empty, closing");
            return;
        }

        out.broadcast(notice(format!("{} left the room.", departed.name)));

        if phase.is_active() && alive_before >= 2 && self.room.alive_count() < 2 {
            self.end_game(GameOverReason::InsufficientPlayers, out);
            return;
        }

        match phase {
            Phase::PreCountdown if countdown_live && departed.is_holding => {
                self.interrupt_countdown(None, departed.name, out);
            }
            Phase::InRound => {
                self.broadcast_status(out);
                self.check_release(out);
            }
            Phase::Waiting => {
                self.broadcast_status(out);
                self.try_arm(out);
            }
            _ => self.broadcast_status(out),
        }
    }

    // -- Timers ------------------------------------------------------------

    fn timer_fired(&mut self, token: TimerToken, out: &mut Outcome) {
        if let Some(timer) = self.room.phase_timer {
            if timer.token == token {
                match timer.kind {
                    PhaseTimerKind::Countdown => self.countdown_tick(out),
                    PhaseTimerKind::Bidding => self.bidding_tick(out),
                }
                return;
            }
        }

        if let Some(delay) = self.room.delay {
            if delay.token == token {
                self.room.delay = None;
                if self.room.phase != delay.expected_phase {
                    tracing::debug!(
                        room_id = %self.room.id,
                        action = ?delay.action,
                        phase = %self.room.phase,
                        "delayed transition dropped, room moved on"
                    );
                    return;
                }
                match delay.action {
                    DelayedAction::StartNextRound => self.start_next_round(out),
                    DelayedAction::RecheckArming => self.recheck_arming(out),
                    DelayedAction::FoldBack => self.fold_back(out),
                }
                return;
            }
        }

        tracing::trace!(room_id = %self.room.id, %token, "stale timer fire");
    }

    fn start_phase_timer(&mut self, kind: PhaseTimerKind, out: &mut Outcome) {
        self.cancel_phase_timer(out);
        let token = self.tokens.next_token();
        self.room.phase_timer = Some(PhaseTimer { kind, token });
        out.timers.push(TimerCommand::Start {
            token,
            schedule: Schedule::Every(TIMING.tick),
        });
    }

    fn cancel_phase_timer(&mut self, out: &mut Outcome) {
        if let Some(timer) = self.room.phase_timer.take() {
            out.timers.push(TimerCommand::Cancel(timer.token));
        }
    }

    /// Schedules `action` to run after `after`, as long as the room is
    /// still in its current phase by then. Replaces any pending delay.
    fn schedule_delay(
        &mut self,
        after: Duration,
        action: DelayedAction,
        out: &mut Outcome,
    ) {
        self.cancel_delay(out);
        let token = self.tokens.next_token();
        self.room.delay = Some(PendingDelay {
            token,
            action,
            expected_phase: self.room.phase,
        });
        out.timers.push(TimerCommand::Start {
            token,
            schedule: Schedule::After(after),
        });
    }

    fn cancel_delay(&mut self, out: &mut Outcome) {
        if let Some(delay) = self.room.delay.take() {
            out.timers.push(TimerCommand::Cancel(delay.token));
        }
    }

    fn cancel_all_timers(&mut self, out: &mut Outcome) {
        self.cancel_phase_timer(out);
        self.cancel_delay(out);
    }

    // -- Arming and countdown ----------------------------------------------

    /// Starts the countdown if every alive player is holding.
    fn try_arm(&mut self, out: &mut Outcome) {
        if self.room.phase != Phase::Waiting || self.room.phase_timer.is_some() {
            return;
        }
        if arming_satisfied(self.room.players.iter().filter(|p| p.is_alive())) {
            self.start_countdown(out);
        }
    }

    fn start_countdown(&mut self, out: &mut Outcome) {
        self.cancel_delay(out);
        self.room.phase = Phase::PreCountdown;
        self.room.pre_round_countdown = TIMING.countdown_secs;
        for player in &mut self.room.players {
            player.has_opted_out = false;
            player.round_hold_duration = 0;
        }
        self.start_phase_timer(PhaseTimerKind::Countdown, out);

        tracing::info!(
            room_id = %self.room.id,
            round = self.room.current_round,
            "countdown started"
        );
        out.broadcast(ServerMessage::CountdownTick {
            remaining: self.room.pre_round_countdown,
        });
        self.broadcast_status(out);
    }

    fn countdown_tick(&mut self, out: &mut Outcome) {
        if self.room.phase != Phase::PreCountdown {
            self.cancel_phase_timer(out);
            return;
        }
        self.room.pre_round_countdown = self.room.pre_round_countdown.saturating_sub(1);
        let remaining = self.room.pre_round_countdown;
        out.broadcast(ServerMessage::CountdownTick { remaining });
        if remaining == 0 {
            self.cancel_phase_timer(out);
            self.open_bidding(out);
        }
    }

    /// A holder let go (or left) while the countdown ran.
    fn interrupt_countdown(
        &mut self,
        releaser: Option<PlayerId>,
        by: String,
        out: &mut Outcome,
    ) {
        self.cancel_phase_timer(out);
        self.room.phase = Phase::Waiting;
        self.room.pre_round_countdown = 0;
        if let Some(player) = releaser.and_then(|id| self.room.player_mut(id)) {
            player.is_holding = false;
            player.has_opted_out = true;
        }

        let holders = self.room.players.iter().filter(|p| p.is_contending()).count();
        tracing::info!(room_id = %self.room.id, %by, holders, "countdown interrupted");

        if holders == 0 {
            out.broadcast(notice("Nothing happening: nobody is holding."));
            self.broadcast_status(out);
            self.schedule_delay(TIMING.idle_fold_back, DelayedAction::FoldBack, out);
        } else {
            out.broadcast(ServerMessage::CountdownInterrupted { by });
            self.broadcast_status(out);
            self.schedule_delay(TIMING.interrupt_grace, DelayedAction::RecheckArming, out);
        }
    }

    /// After the grace period: restart the countdown if everyone still
    /// in the round is holding, otherwise reset the round.
    fn recheck_arming(&mut self, out: &mut Outcome) {
        let survivors = self
            .room
            .players
            .iter()
            .filter(|p| p.is_alive() && !p.has_opted_out);
        if self.room.phase_timer.is_none() && arming_satisfied(survivors) {
            self.start_countdown(out);
        } else {
            self.fold_back(out);
        }
    }

    /// Back to waiting for the same round number.
    fn fold_back(&mut self, out: &mut Outcome) {
        self.cancel_phase_timer(out);
        self.reset_round_keeping_holds();
        self.room.phase = Phase::Waiting;
        self.room.pre_round_countdown = 0;
        self.room.active_players.clear();

        tracing::info!(
            room_id = %self.room.id,
            round = self.room.current_round,
            "round reset, waiting for holders"
        );
        out.broadcast(ServerMessage::RoundStarted {
            round: self.room.current_round,
            max_rounds: self.room.config.max_rounds,
        });
        self.broadcast_status(out);
        self.try_arm(out);
    }

    // -- Bidding -----------------------------------------------------------

    /// Countdown reached zero: whoever is still holding contests the round.
    fn open_bidding(&mut self, out: &mut Outcome) {
        let room_id = self.room.id;
        let round = self.room.current_round;

        for player in &mut self.room.players {
            if player.time_budget == 0 && !player.is_eliminated {
                player.eliminate();
                tracing::info!(%room_id, player_id = %player.id, "eliminated with no time left");
            }
            if !player.is_holding {
                player.has_opted_out = true;
            }
        }

        let contenders: Vec<Contender> = self
            .room
            .players
            .iter()
            .filter(|p| p.is_contending())
            .map(Player::contender)
            .collect();

        if contenders.is_empty() {
            self.room.active_players.clear();
            self.room.phase = Phase::RoundEnded;
            tracing::info!(%room_id, round, "nobody contested the round");
            out.broadcast(notice("No one contested this round."));
            out.broadcast(ServerMessage::RoundUnclaimed { round });
            self.broadcast_status(out);
            self.schedule_delay(TIMING.no_contest_delay, DelayedAction::StartNextRound, out);
            return;
        }

        self.room.active_players = contenders.iter().map(|c| c.player_id).collect();
        self.room.round_elapsed_time = 0;
        self.room.phase = Phase::InRound;
        self.start_phase_timer(PhaseTimerKind::Bidding, out);

        tracing::info!(%room_id, round, contenders = contenders.len(), "bidding opened");
        out.broadcast(ServerMessage::BiddingStarted { round, contenders });
        self.broadcast_status(out);
    }

    fn bidding_tick(&mut self, out: &mut Outcome) {
        if self.room.phase != Phase::InRound {
            self.cancel_phase_timer(out);
            return;
        }
        let room_id = self.room.id;
        self.room.round_elapsed_time += 1;

        let mut exhausted = Vec::new();
        for player in self.room.players.iter_mut().filter(|p| p.is_contending()) {
            player.round_hold_duration += 1;
            if player.round_hold_duration >= player.time_budget {
                let held = player.exhaust();
                tracing::info!(%room_id, player_id = %player.id, held, "out of time, eliminated");
                exhausted.push((player.contender(), held));
            }
        }

        for (who, held) in exhausted {
            out.broadcast(ServerMessage::BudgetExhausted {
                player_id: who.player_id,
                name: who.name,
                held,
            });
        }
        out.broadcast(ServerMessage::BiddingElapsed {
            elapsed: self.room.round_elapsed_time,
        });
        self.broadcast_status(out);
        self.check_release(out);
    }

    /// Ends bidding once no active player is still holding.
    fn check_release(&mut self, out: &mut Outcome) {
        if self.room.phase != Phase::InRound {
            return;
        }
        let room = &self.room;
        let anyone_holding = room
            .active_players
            .iter()
            .filter_map(|id| room.player(*id))
            .any(Player::is_contending);
        if !anyone_holding {
            self.cancel_phase_timer(out);
            self.resolve_round(out);
        }
    }

    fn resolve_round(&mut self, out: &mut Outcome) {
        let room_id = self.room.id;
        let round = self.room.current_round;
        let room = &self.room;
        let candidates: Vec<(PlayerId, u32)> = room
            .active_players
            .iter()
            .filter_map(|id| room.player(*id))
            .filter(|p| !p.has_opted_out && !p.is_eliminated)
            .map(|p| (p.id, p.round_hold_duration))
            .collect();

        self.room.phase = Phase::RoundEnded;
        match round_winners(&candidates) {
            Some((ids, duration)) => {
                let mut winners = Vec::with_capacity(ids.len());
                for id in ids {
                    if let Some(player) = self.room.player_mut(id) {
                        player.tokens += 1;
                        player.time_budget = player.time_budget.saturating_sub(duration);
                        winners.push(player.contender());
                    }
                }
                let tie = winners.len() > 1;
                tracing::info!(%room_id, round, duration, winners = winners.len(), tie, "round won");
                out.broadcast(ServerMessage::RoundWon {
                    round,
                    winners,
                    duration,
                    tie,
                });
            }
            None => {
                tracing::info!(%room_id, round, "round ended without a winner");
                out.broadcast(ServerMessage::RoundUnclaimed { round });
            }
        }

        for player in &mut self.room.players {
            player.is_holding = false;
            player.has_opted_out = false;
        }
        self.broadcast_status(out);
        self.schedule_delay(TIMING.resolution_delay, DelayedAction::StartNextRound, out);
    }

    // -- Rounds and game over ----------------------------------------------

    /// Clears per-round state. A button a live player is still pressing
    /// stays pressed, so it counts toward the next arming check.
    fn reset_round_keeping_holds(&mut self) {
        for player in &mut self.room.players {
            let holding = player.is_holding && player.is_alive();
            player.reset_round();
            player.is_holding = holding;
        }
    }

    fn start_next_round(&mut self, out: &mut Outcome) {
        let alive = self.room.alive_count();
        if self.room.current_round > 0 && alive <= 1 {
            let reason = if alive == 0 {
                GameOverReason::AllEliminated
            } else {
                GameOverReason::SoleSurvivor
            };
            self.end_game(reason, out);
            return;
        }
        if self.room.current_round >= self.room.config.max_rounds {
            self.end_game(GameOverReason::RoundsExhausted, out);
            return;
        }

        self.room.current_round += 1;
        self.reset_round_keeping_holds();
        self.room.phase = Phase::Waiting;
        self.room.pre_round_countdown = 0;
        self.room.round_elapsed_time = 0;
        self.room.active_players.clear();

        let round = self.room.current_round;
        tracing::info!(room_id = %self.room.id, round, "round started");
        out.broadcast(ServerMessage::RoundStarted {
            round,
            max_rounds: self.room.config.max_rounds,
        });
        let finished = round - 1;
        if finished > 0 && finished % TIMING.stats_prompt_every == 0 {
            out.broadcast(ServerMessage::StatsPrompt { round: finished });
        }
        self.broadcast_status(out);
        self.try_arm(out);
    }

    fn end_game(&mut self, reason: GameOverReason, out: &mut Outcome) {
        self.cancel_all_timers(out);
        self.room.phase = Phase::GameOver;
        self.room.game_over_reason = Some(reason);
        self.room.pre_round_countdown = 0;
        self.room.active_players.clear();
        for player in &mut self.room.players {
            player.is_holding = false;
        }

        tracing::info!(room_id = %self.room.id, %reason, "game over");
        out.broadcast(self.game_over_message(reason));
        self.broadcast_status(out);
    }

    fn game_over_message(&self, reason: GameOverReason) -> ServerMessage {
        let (standings, result) = final_standings(&self.room.players);
        ServerMessage::GameOver {
            standings,
            result,
            reason,
        }
    }

    // -- Messages ----------------------------------------------------------

    fn broadcast_status(&self, out: &mut Outcome) {
        out.broadcast(ServerMessage::RoomStatus(self.room.snapshot()));
    }

    /// Catches a new arrival up on the phase in progress.
    fn replay_phase(&self, player_id: PlayerId, out: &mut Outcome) {
        let room = &self.room;
        let msg = match room.phase {
            Phase::Waiting if room.current_round > 0 => Some(ServerMessage::RoundStarted {
                round: room.current_round,
                max_rounds: room.config.max_rounds,
            }),
            Phase::PreCountdown => Some(ServerMessage::CountdownTick {
                remaining: room.pre_round_countdown,
            }),
            Phase::InRound => Some(ServerMessage::BiddingElapsed {
                elapsed: room.round_elapsed_time,
            }),
            Phase::GameOver => room
                .game_over_reason
                .map(|reason| self.game_over_message(reason)),
            _ => None,
        };
        if let Some(msg) = msg {
            out.send_to(player_id, msg);
        }
    }
}
