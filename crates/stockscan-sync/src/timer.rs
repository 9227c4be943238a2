//! # Flush Timer
//!
//! Debounce countdown that decides when a scan batch is flushed.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Countdown States                                 │
//! │                                                                         │
//! │            reset(d)                       reset(d)                      │
//! │   ┌──────┐ ───────────────► ┌──────────────────────┐ ──┐               │
//! │   │ Idle │                  │ Counting(now + d)    │   │ replaces the  │
//! │   └──────┘ ◄─────────────── └──────────────────────┘ ◄─┘ deadline      │
//! │       ▲      expiry (fires once)       │                                │
//! │       └──────────────────────────────── cancel() (never fires)          │
//! │                                                                         │
//! │  Scans:     X@0s        X@5s                                            │
//! │  Deadline:  ──► 10s     ──► 15s  ...........  fires @15s               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! There is exactly one deadline slot, so at most one countdown is ever
//! live. Time comes from `tokio::time`, which tests drive with a paused
//! clock (`tokio::time::pause` / `advance`) instead of real sleeps.

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

/// Stand-in for deadlines that do not fit in an `Instant` (about 30 years).
pub const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Countdown state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CountdownState {
    /// No countdown running.
    #[default]
    Idle,

    /// Counting down to `deadline`.
    Counting { deadline: Instant },
}

/// A countdown that has fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expiry {
    /// Sequence number of the countdown (one per `reset`).
    pub countdown: u64,

    /// The deadline that was reached.
    pub deadline: Instant,
}

/// Single-slot debounce timer with reset/cancel semantics.
#[derive(Debug, Default)]
pub struct FlushTimer {
    state: CountdownState,
    countdown: u64,
}

impl FlushTimer {
    /// Creates an idle timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a countdown of `duration`, replacing any running one.
    ///
    /// A duration too large to add to the clock counts down to a deadline
    /// [`FAR_FUTURE`] away instead.
    pub fn reset(&mut self, duration: Duration) {
        let now = Instant::now();
        let deadline = now
            .checked_add(duration)
            .unwrap_or_else(|| now + FAR_FUTURE);
        self.countdown += 1;
        self.state = CountdownState::Counting { deadline };
        debug!(countdown = self.countdown, ?duration, "Flush countdown reset");
    }

    /// Stops the countdown without firing. Returns true if one was running.
    pub fn cancel(&mut self) -> bool {
        let was_counting = self.is_counting();
        if was_counting {
            debug!(countdown = self.countdown, "Flush countdown cancelled");
        }
        self.state = CountdownState::Idle;
        was_counting
    }

    /// Current state.
    pub fn state(&self) -> CountdownState {
        self.state
    }

    /// Returns true while a countdown is running.
    pub fn is_counting(&self) -> bool {
        matches!(self.state, CountdownState::Counting { .. })
    }

    /// Deadline of the running countdown.
    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            CountdownState::Idle => None,
            CountdownState::Counting { deadline } => Some(deadline),
        }
    }

    /// Time left until the deadline (zero once it has passed).
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline()
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Fires the countdown if its deadline is at or before `now`.
    ///
    /// Used to settle a pending expiry before handling input that arrives
    /// in the same instant, so the expiry always wins the tie.
    pub fn take_due(&mut self, now: Instant) -> Option<Expiry> {
        match self.state {
            CountdownState::Counting { deadline } if deadline <= now => {
                self.state = CountdownState::Idle;
                Some(Expiry {
                    countdown: self.countdown,
                    deadline,
                })
            }
            _ => None,
        }
    }

    /// Waits for the running countdown to fire.
    ///
    /// Never completes while idle. Cancel-safe: dropping the future before
    /// it completes leaves the countdown untouched, so it can sit in a
    /// `tokio::select!` next to other branches.
    pub async fn expired(&mut self) -> Expiry {
        match self.state {
            CountdownState::Idle => std::future::pending().await,
            CountdownState::Counting { deadline } => {
                tokio::time::sleep_until(deadline).await;
                self.state = CountdownState::Idle;
                Expiry {
                    countdown: self.countdown,
                    deadline,
                }
            }
        }
    }
}
