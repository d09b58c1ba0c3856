//! Debounce scheduler
//!
//! Two states: Idle and Armed(deadline). Every recorded change re-arms the
//! timer, so the pipeline fires once per quiet period and never while
//! changes are still arriving.

use std::future::pending;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};

/// Default quiet period before the pipeline fires
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Armed { deadline: Instant },
}

/// Single resettable timer owned by one pipeline
#[derive(Debug)]
pub struct DebounceScheduler {
    delay: Duration,
    state: TimerState,
}

impl DebounceScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            state: TimerState::Idle,
        }
    }

    /// Arm or re-arm the timer to expire `delay` after `now`
    pub fn arm(&mut self, now: Instant) {
        self.state = TimerState::Armed {
            deadline: now + self.delay,
        };
    }

    /// Return to Idle without firing
    pub fn cancel(&mut self) {
        self.state = TimerState::Idle;
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.state, TimerState::Armed { .. })
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Fire if the deadline has passed at `now`
    ///
    /// Returns true exactly once per arming; the timer is Idle afterwards.
    pub fn poll_expired(&mut self, now: Instant) -> bool {
        match self.state {
            TimerState::Armed { deadline } if now >= deadline => {
                self.state = TimerState::Idle;
                true
            }
            _ => false,
        }
    }

    /// Wait for the armed deadline, then go Idle
    ///
    /// Never completes while Idle. Cancel safe: dropping the future before
    /// the deadline leaves the timer armed.
    pub async fn expired(&mut self) {
        let TimerState::Armed { deadline } = self.state else {
            return pending().await;
        };

        sleep_until(deadline).await;
        self.state = TimerState::Idle;
    }
}

impl Default for DebounceScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}
