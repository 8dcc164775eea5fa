//! Per-player game state inside a room.

use holdfast_protocol::{Contender, PlayerId, PlayerView, Standing};

/// One occupant of a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Seconds of holding the player has left to spend.
    pub time_budget: u32,
    /// Rounds won.
    pub tokens: u32,
    pub is_holding: bool,
    /// Out of the current round (released during the countdown, was not
    /// holding when bidding opened, or ran out of time).
    pub has_opted_out: bool,
    /// Seconds held in the current bidding phase.
    pub round_hold_duration: u32,
    /// Out of the game for good.
    pub is_eliminated: bool,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>, time_budget: u32) -> Self {
        Self {
            id,
            name: name.into(),
            time_budget,
            tokens: 0,
            is_holding: false,
            has_opted_out: false,
            round_hold_duration: 0,
            is_eliminated: false,
        }
    }

    /// Still in the game.
    pub fn is_alive(&self) -> bool {
        !self.is_eliminated
    }

    /// Holding, and still in the running for this round.
    pub fn is_contending(&self) -> bool {
        self.is_holding && !self.has_opted_out && !self.is_eliminated
    }

    /// Clears everything that only lives for one round.
    pub fn reset_round(&mut self) {
        self.is_holding = false;
        self.has_opted_out = false;
        self.round_hold_duration = 0;
    }

    /// Removes the player from the game for good.
    pub fn eliminate(&mut self) {
        self.is_holding = false;
        self.has_opted_out = true;
        self.is_eliminated = true;
        self.time_budget = 0;
    }

    /// The player held for their whole remaining budget. Returns the
    /// seconds credited for the hold, which never exceed what was left.
    pub fn exhaust(&mut self) -> u32 {
        self.round_hold_duration = self.round_hold_duration.min(self.time_budget);
        self.eliminate();
        self.round_hold_duration
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            player_id: self.id,
            name: self.name.clone(),
            time_budget: self.time_budget,
            tokens: self.tokens,
            is_holding: self.is_holding,
            has_opted_out: self.has_opted_out,
            round_hold_duration: self.round_hold_duration,
            is_eliminated: self.is_eliminated,
        }
    }

    pub fn contender(&self) -> Contender {
        Contender {
            player_id: self.id,
            name: self.name.clone(),
        }
    }

    pub fn standing(&self, rank: Option<u32>) -> Standing {
        Standing {
            rank,
            player_id: self.id,
            name: self.name.clone(),
            tokens: self.tokens,
            time_budget: self.time_budget,
            is_eliminated: self.is_eliminated,
        }
    }
}
