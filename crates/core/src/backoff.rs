// SPDX-License-Identifier: MIT

//! Bounded exponential backoff for transient infrastructure failures
//! (`spec.md` §7, point 2: "the calling component retries with exponential
//! backoff bounded by a deadline").
//!
//! Shared by the Worker Runtime's heartbeat emitter and any Store/Broker
//! client wrapper that wants the same retry-then-give-up shape.

use crate::clock::Clock;
use std::time::Duration;

/// A bounded exponential backoff schedule. Doubles `base` on every call to
/// [`Backoff::next`] up to `max`, and reports `is_exhausted` once the total
/// elapsed time (tracked via the injected [`Clock`]) would pass `deadline`
/// from the moment the backoff was created.
pub struct Backoff<C: Clock> {
    clock: C,
    started_at: chrono::DateTime<chrono::Utc>,
    deadline: Duration,
    base: Duration,
    max: Duration,
    attempt: u32,
}

impl<C: Clock> Backoff<C> {
    pub fn new(clock: C, deadline: Duration, base: Duration, max: Duration) -> Self {
        let started_at = clock.now();
        Self { clock, started_at, deadline, base, max, attempt: 0 }
    }

    /// Delay to wait before the next retry, and whether the deadline has
    /// already elapsed (in which case the caller should give up instead of
    /// sleeping — `spec.md` §7: "after the deadline a background operation
    /// logs and is retried on the next tick, a synchronous operation returns
    /// UNAVAILABLE").
    pub fn next(&mut self) -> BackoffStep {
        if self.is_exhausted() {
            return BackoffStep::Exhausted;
        }
        let factor = 1u32.checked_shl(self.attempt.min(31)).unwrap_or(u32::MAX);
        let delay = self.base.saturating_mul(factor).min(self.max);
        self.attempt += 1;
        BackoffStep::Retry(delay)
    }

    pub fn is_exhausted(&self) -> bool {
        let elapsed = self.clock.now() - self.started_at;
        match chrono::Duration::from_std(self.deadline) {
            Ok(deadline) => elapsed >= deadline,
            Err(_) => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffStep {
    Retry(Duration),
    Exhausted,
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;
