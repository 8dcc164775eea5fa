//! Room configuration and fixed round timing.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::RoomError;

/// Smallest starting time budget, in seconds.
pub const MIN_INITIAL_TIME: u32 = 10;
/// Largest starting time budget, in seconds.
pub const MAX_INITIAL_TIME: u32 = 600;
pub const MIN_ROUNDS: u32 = 1;
pub const MAX_ROUNDS: u32 = 50;
/// Occupant cap per room.
pub const MAX_PLAYERS: usize = 4;

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Settings chosen by the player who creates a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Starting time budget for every player, in seconds. Late joiners
    /// get this same budget.
    pub initial_time: u32,

    /// Number of rounds before the game ends on its own.
    pub max_rounds: u32,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            initial_time: 60,
            max_rounds: 5,
        }
    }
}

impl RoomConfig {
    pub fn new(initial_time: u32, max_rounds: u32) -> Self {
        Self {
            initial_time,
            max_rounds,
        }
    }

    /// Checks both settings against their allowed ranges.
    ///
    /// # Errors
    /// Returns [`RoomError::InvalidConfig`] naming the first field out
    /// of range.
    pub fn validate(&self) -> Result<(), RoomError> {
        check_range(
            "initial_time",
            self.initial_time,
            MIN_INITIAL_TIME,
            MAX_INITIAL_TIME,
        )?;
        check_range("max_rounds", self.max_rounds, MIN_ROUNDS, MAX_ROUNDS)
    }
}

fn check_range(
    field: &'static str,
    value: u32,
    min: u32,
    max: u32,
) -> Result<(), RoomError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(RoomError::InvalidConfig {
            field,
            value,
            min,
            max,
        })
    }
}

// ---------------------------------------------------------------------------
// RoundTiming
// ---------------------------------------------------------------------------

/// Durations that drive a round. Fixed for every room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundTiming {
    /// Seconds counted down before bidding opens.
    pub countdown_secs: u32,
    /// Period of both the countdown and the bidding tick.
    pub tick: Duration,
    /// Pause after a countdown that nobody contested.
    pub no_contest_delay: Duration,
    /// Pause after a round is scored, before the next one starts.
    pub resolution_delay: Duration,
    /// Grace period after an interrupted countdown before re-checking
    /// whether the remaining holders can re-arm it.
    pub interrupt_grace: Duration,
    /// Pause after an interrupted countdown that left nobody holding.
    pub idle_fold_back: Duration,
    /// An advisory stats prompt goes out after every this-many rounds.
    pub stats_prompt_every: u32,
}

/// The timing every room runs on.
pub const TIMING: RoundTiming = RoundTiming {
    countdown_secs: 5,
    tick: Duration::from_secs(1),
    no_contest_delay: Duration::from_secs(2),
    resolution_delay: Duration::from_secs(3),
    interrupt_grace: Duration::from_millis(1500),
    idle_fold_back: Duration::from_secs(1),
    stats_prompt_every: 3,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(RoomConfig::default().validate().is_ok());
    }

    #[test]
    fn test_bounds_are_inclusive() {
        assert!(RoomConfig::new(10, 1).validate().is_ok());
        assert!(RoomConfig::new(600, 50).validate().is_ok());
    }

    #[test]
    fn test_initial_time_out_of_range() {
        for bad in [0, 9, 601, u32::MAX] {
            let err = RoomConfig::new(bad, 3).validate().unwrap_err();
            assert!(
                matches!(err, RoomError::InvalidConfig { field: "initial_time", .. }),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_max_rounds_out_of_range() {
        for bad in [0, 51] {
            let err = RoomConfig::new(60, bad).validate().unwrap_err();
            assert!(matches!(
                err,
                RoomError::InvalidConfig { field: "max_rounds", .. }
            ));
        }
    }

    #[test]
    fn test_timing_constants() {
        assert_eq!(TIMING.countdown_secs, 5);
        assert_eq!(TIMING.tick, Duration::from_secs(1));
        assert!(TIMING.interrupt_grace < TIMING.no_contest_delay);
        assert!(TIMING.no_contest_delay < TIMING.resolution_delay);
    }
}
