//! Integration tests for the timer driver.
//!
//! Every test runs on a paused Tokio clock; the runtime auto-advances
//! time whenever all tasks are idle, so multi-second schedules resolve
//! instantly and deterministically.

use std::time::Duration;

use holdfast_timer::{Schedule, TickPolicy, Timers, TokenSource};
use tokio::time::{self, Instant};

// =========================================================================
// One-shot delays
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_after_fires_once_at_the_delay() {
    let (mut timers, mut fired) = Timers::new(TickPolicy::Skip);
    let mut tokens = TokenSource::new();
    let token = tokens.next_token();
    let start = Instant::now();

    timers.start(token, Schedule::After(Duration::from_secs(3)));

    assert_eq!(fired.recv().await, Some(token));
    assert_eq!(start.elapsed(), Duration::from_secs(3));

    // Nothing else arrives.
    let more = time::timeout(Duration::from_secs(10), fired.recv()).await;
    assert!(more.is_err(), "a one-shot timer must fire exactly once");
}

#[tokio::test(start_paused = true)]
async fn test_shorter_delay_fires_first() {
    let (mut timers, mut fired) = Timers::new(TickPolicy::Skip);
    let mut tokens = TokenSource::new();
    let slow = tokens.next_token();
    let fast = tokens.next_token();

    timers.start(slow, Schedule::After(Duration::from_secs(3)));
    timers.start(fast, Schedule::After(Duration::from_millis(1500)));

    assert_eq!(fired.recv().await, Some(fast));
    assert_eq!(fired.recv().await, Some(slow));
}

// =========================================================================
// Repeating ticks
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_every_fires_once_per_period() {
    let (mut timers, mut fired) = Timers::new(TickPolicy::Skip);
    let mut tokens = TokenSource::new();
    let token = tokens.next_token();
    let start = Instant::now();

    timers.start(token, Schedule::Every(Duration::from_secs(1)));

    for expected in 1..=5u64 {
        assert_eq!(fired.recv().await, Some(token));
        assert_eq!(start.elapsed(), Duration::from_secs(expected));
    }
    assert!(timers.is_live(token));
}

#[tokio::test(start_paused = true)]
async fn test_zero_period_is_clamped_instead_of_panicking() {
    let (mut timers, mut fired) = Timers::new(TickPolicy::Skip);
    let mut tokens = TokenSource::new();
    let token = tokens.next_token();

    timers.start(token, Schedule::Every(Duration::ZERO));

    assert_eq!(fired.recv().await, Some(token));
    timers.cancel(token);
}

// =========================================================================
// Cancellation
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_cancel_prevents_fire() {
    let (mut timers, mut fired) = Timers::new(TickPolicy::Skip);
    let mut tokens = TokenSource::new();
    let token = tokens.next_token();

    timers.start(token, Schedule::After(Duration::from_secs(2)));
    assert!(timers.cancel(token));
    assert!(!timers.is_live(token));

    let result = time::timeout(Duration::from_secs(5), fired.recv()).await;
    assert!(result.is_err(), "cancelled timer must not fire");
}

#[tokio::test(start_paused = true)]
async fn test_cancel_unknown_token_returns_false() {
    let (mut timers, _fired) = Timers::new(TickPolicy::Skip);
    let mut tokens = TokenSource::new();
    assert!(!timers.cancel(tokens.next_token()));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_stops_a_repeating_timer() {
    let (mut timers, mut fired) = Timers::new(TickPolicy::Skip);
    let mut tokens = TokenSource::new();
    let token = tokens.next_token();

    timers.start(token, Schedule::Every(Duration::from_secs(1)));
    assert_eq!(fired.recv().await, Some(token));
    assert_eq!(fired.recv().await, Some(token));

    timers.cancel(token);
    let result = time::timeout(Duration::from_secs(5), fired.recv()).await;
    assert!(result.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_restart_under_same_token_replaces_schedule() {
    let (mut timers, mut fired) = Timers::new(TickPolicy::Skip);
    let mut tokens = TokenSource::new();
    let token = tokens.next_token();
    let start = Instant::now();

    timers.start(token, Schedule::After(Duration::from_secs(1)));
    timers.start(token, Schedule::After(Duration::from_secs(4)));

    assert_eq!(fired.recv().await, Some(token));
    assert_eq!(start.elapsed(), Duration::from_secs(4));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_all_reports_running_timers() {
    let (mut timers, mut fired) = Timers::new(TickPolicy::Skip);
    let mut tokens = TokenSource::new();

    timers.start(tokens.next_token(), Schedule::Every(Duration::from_secs(1)));
    timers.start(tokens.next_token(), Schedule::After(Duration::from_secs(2)));
    assert_eq!(timers.live_count(), 2);

    assert_eq!(timers.cancel_all(), 2);
    assert_eq!(timers.live_count(), 0);

    let result = time::timeout(Duration::from_secs(5), fired.recv()).await;
    assert!(result.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_fired_one_shot_is_no_longer_live() {
    let (mut timers, mut fired) = Timers::new(TickPolicy::Skip);
    let mut tokens = TokenSource::new();
    let token = tokens.next_token();

    timers.start(token, Schedule::After(Duration::from_secs(1)));
    assert_eq!(fired.recv().await, Some(token));

    // Let the finished task wind down.
    tokio::task::yield_now().await;
    time::sleep(Duration::from_millis(1)).await;
    assert!(!timers.is_live(token));
}

#[tokio::test(start_paused = true)]
async fn test_dropping_driver_closes_channel() {
    let (mut timers, mut fired) = Timers::new(TickPolicy::Skip);
    let mut tokens = TokenSource::new();
    timers.start(tokens.next_token(), Schedule::Every(Duration::from_secs(1)));

    drop(timers);

    let result = time::timeout(Duration::from_secs(5), fired.recv())
        .await
        .expect("channel should close once aborted tasks are dropped");
    assert_eq!(result, None);
}
