//! Sliding-window rate limiter.
//!
//! Counts calls inside a trailing window, recomputed on every check.
//! The check is a compound read-modify-write, so the whole window sits
//! behind one mutex; contended callers wait for exclusive access
//! rather than racing past the limit.

use crate::config::RateLimitConfig;
use crate::error::{SyncError, SyncResult};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// A sliding-window call-rate guard.
pub struct RateLimiter {
    window: Mutex<VecDeque<Instant>>,
    max_calls: u32,
    window_len: Duration,
}

impl RateLimiter {
    /// Creates a limiter allowing `max_calls` per `window_len`.
    pub fn new(max_calls: u32, window_len: Duration) -> Self {
        Self {
            window: Mutex::new(VecDeque::new()),
            max_calls,
            window_len,
        }
    }

    /// Creates a limiter from configuration.
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_calls, config.window)
    }

    /// Records one call, or fails if the window is full.
    pub fn check_rate_limit(&self) -> SyncResult<()> {
        self.check_rate_limit_at(Instant::now())
    }

    /// Like [`check_rate_limit`](Self::check_rate_limit) with an
    /// explicit clock, so tests can advance simulated time.
    pub fn check_rate_limit_at(&self, now: Instant) -> SyncResult<()> {
        let mut window = self.window.lock();
        Self::prune(&mut window, now, self.window_len);

        if window.len() >= self.max_calls as usize {
            return Err(SyncError::RateLimitExceeded {
                limit: self.max_calls,
                window: self.window_len,
            });
        }
        window.push_back(now);
        Ok(())
    }

    /// Calls still available in the current window. Non-mutating.
    pub fn remaining_calls(&self) -> u32 {
        self.remaining_calls_at(Instant::now())
    }

    /// Like [`remaining_calls`](Self::remaining_calls) with an
    /// explicit clock.
    pub fn remaining_calls_at(&self, now: Instant) -> u32 {
        let window = self.window.lock();
        let live = window
            .iter()
            .filter(|t| now.duration_since(**t) < self.window_len)
            .count();
        self.max_calls.saturating_sub(live as u32)
    }

    /// Clears the window unconditionally. Test and administrative use.
    pub fn reset(&self) {
        self.window.lock().clear();
    }

    fn prune(window: &mut VecDeque<Instant>, now: Instant, window_len: Duration) {
        while let Some(front) = window.front() {
            if now.duration_since(*front) >= window_len {
                window.pop_front();
            } else {
                break;
            }
        }
    }
}
