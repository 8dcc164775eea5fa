//! Cancellable timers for Holdfast room actors.
//!
//! The round engine never sleeps. When it wants "tick every second" or
//! "run this in three seconds" it allocates a [`TimerToken`] from a
//! [`TokenSource`] and asks the room actor to start a [`Schedule`] under
//! that token. The actor's [`Timers`] driver spawns a small Tokio task
//! per token and delivers the token back over a channel each time it
//! fires.
//!
//! Cancellation is token based: the engine remembers which token is live
//! for each slot and ignores any fire whose token it no longer holds. A
//! fire that was already queued when its timer got cancelled therefore
//! can never act on a newer phase.
//!
//! # Integration
//!
//! ```ignore
//! let (mut timers, mut fired) = Timers::new(TickPolicy::Skip);
//! loop {
//!     tokio::select! {
//!         Some(cmd) = commands.recv() => { /* player actions */ }
//!         Some(token) = fired.recv() => {
//!             let outcome = engine.advance(Input::TimerFired(token));
//!             // apply outcome.timers to `timers`
//!         }
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// Names one scheduled timer. Tokens are never reused within a
/// [`TokenSource`], so comparing tokens is enough to tell a live timer
/// from a stale one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(u64);

impl TimerToken {
    /// Returns the raw token value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T-{}", self.0)
    }
}

/// Hands out strictly increasing [`TimerToken`]s.
#[derive(Debug, Default)]
pub struct TokenSource {
    last: u64,
}

impl TokenSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the next token.
    pub fn next_token(&mut self) -> TimerToken {
        self.last += 1;
        TimerToken(self.last)
    }
}

// ---------------------------------------------------------------------------
// Schedules
// ---------------------------------------------------------------------------

/// When a timer fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Once, after the given delay.
    After(Duration),
    /// Repeatedly, first after one period, until cancelled.
    Every(Duration),
}

/// What a repeating timer does when the actor falls behind and ticks are
/// missed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TickPolicy {
    /// Skip the missed ticks and resume on the original cadence.
    /// Keeps one tick per elapsed period, which is what a seconds
    /// counter wants.
    #[default]
    Skip,
    /// Fire the missed ticks back to back.
    CatchUp,
    /// Fire once now and restart the cadence from here.
    Delay,
}

impl From<TickPolicy> for MissedTickBehavior {
    fn from(policy: TickPolicy) -> Self {
        match policy {
            TickPolicy::Skip => MissedTickBehavior::Skip,
            TickPolicy::CatchUp => MissedTickBehavior::Burst,
            TickPolicy::Delay => MissedTickBehavior::Delay,
        }
    }
}

/// Smallest period a repeating timer may use. `tokio::time::interval`
/// panics on a zero period.
const MIN_PERIOD: Duration = Duration::from_millis(1);

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Runs scheduled timers as Tokio tasks and reports fires on a channel.
///
/// One `Timers` per room actor. Dropping it aborts every outstanding
/// timer.
pub struct Timers {
    fired: mpsc::UnboundedSender<TimerToken>,
    live: HashMap<TimerToken, JoinHandle<()>>,
    policy: TickPolicy,
}

impl Timers {
    /// Creates a driver and the receiver its fires arrive on.
    pub fn new(policy: TickPolicy) -> (Self, mpsc::UnboundedReceiver<TimerToken>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let timers = Self {
            fired: tx,
            live: HashMap::new(),
            policy,
        };
        (timers, rx)
    }

    /// Starts `schedule` under `token`. A timer already running under
    /// the same token is replaced.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&mut self, token: TimerToken, schedule: Schedule) {
        self.prune();
        if let Some(previous) = self.live.remove(&token) {
            previous.abort();
        }

        let fired = self.fired.clone();
        let handle = match schedule {
            Schedule::After(delay) => tokio::spawn(async move {
                time::sleep(delay).await;
                let _ = fired.send(token);
            }),
            Schedule::Every(period) => {
                let period = if period < MIN_PERIOD {
                    warn!(%token, ?period, "timer period too small, clamping");
                    MIN_PERIOD
                } else {
                    period
                };
                let behavior = MissedTickBehavior::from(self.policy);
                tokio::spawn(async move {
                    let mut interval =
                        time::interval_at(Instant::now() + period, period);
                    interval.set_missed_tick_behavior(behavior);
                    loop {
                        interval.tick().await;
                        trace!(%token, "timer tick");
                        if fired.send(token).is_err() {
                            break;
                        }
                    }
                })
            }
        };

        debug!(%token, ?schedule, "timer started");
        self.live.insert(token, handle);
    }

    /// Stops the timer running under `token`.
    ///
    /// Returns `false` if no such timer was running. A fire already sent
    /// on the channel is not recalled; callers discard it by token.
    pub fn cancel(&mut self, token: TimerToken) -> bool {
        match self.live.remove(&token) {
            Some(handle) => {
                handle.abort();
                debug!(%token, "timer cancelled");
                true
            }
            None => false,
        }
    }

    /// Stops every timer. Returns how many were still running.
    pub fn cancel_all(&mut self) -> usize {
        let mut stopped = 0;
        for (_, handle) in self.live.drain() {
            if !handle.is_finished() {
                stopped += 1;
            }
            handle.abort();
        }
        if stopped > 0 {
            debug!(stopped, "all timers cancelled");
        }
        stopped
    }

    /// Returns `true` if a timer under `token` has not finished yet.
    pub fn is_live(&self, token: TimerToken) -> bool {
        self.live
            .get(&token)
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Number of timers that have not finished.
    pub fn live_count(&self) -> usize {
        self.live.values().filter(|h| !h.is_finished()).count()
    }

    /// The missed-tick policy repeating timers use.
    pub fn policy(&self) -> TickPolicy {
        self.policy
    }

    /// Forgets one-shot timers that already fired.
    fn prune(&mut self) {
        self.live.retain(|_, handle| !handle.is_finished());
    }
}

impl Drop for Timers {
    fn drop(&mut self) {
        for (_, handle) in self.live.drain() {
            handle.abort();
        }
    }
}
