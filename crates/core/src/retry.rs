// SPDX-License-Identifier: MIT

//! Retry/backoff policy (`spec.md` §4.6).
//!
//! `next_delay` is a pure function of `(attempt, policy, base)` plus an
//! injected jitter source, mirroring the `Clock`/`FakeClock` split in
//! [`crate::clock`] so delay math stays deterministic under test.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry policy tag carried on a job (`spec.md` §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryPolicyKind {
    Fixed,
    Exponential,
    Jitter,
}

crate::simple_display! {
    RetryPolicyKind {
        Fixed => "fixed",
        Exponential => "exponential",
        Jitter => "jitter",
    }
}

/// Default cap applied to exponential growth (`spec.md` §4.6).
pub const DEFAULT_MAX_CAP: Duration = Duration::from_secs(3600);

/// Source of the uniform random component used by [`RetryPolicyKind::Jitter`].
///
/// Production code uses [`ThreadRngJitter`]; tests use [`FakeJitter`] to pin
/// the random draw and make delay assertions exact.
pub trait JitterSource {
    /// Draw a value uniformly from `[0, max)`. Returns `Duration::ZERO` if `max` is zero.
    fn uniform(&self, max: Duration) -> Duration;
}

/// Jitter source backed by the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngJitter;

impl JitterSource for ThreadRngJitter {
    fn uniform(&self, max: Duration) -> Duration {
        if max.is_zero() {
            return Duration::ZERO;
        }
        max.mul_f64(fastrand::f64())
    }
}

/// A jitter source that always returns a fixed duration. Used in tests so
/// retry-delay assertions don't have to tolerate a random range.
#[derive(Debug, Clone, Copy)]
pub struct FakeJitter(pub Duration);

impl JitterSource for FakeJitter {
    fn uniform(&self, max: Duration) -> Duration {
        self.0.min(max)
    }
}

/// Compute the delay before the next attempt, given the number of failures
/// already observed (`attempt`), the policy, and the configured base delay.
///
/// `spec.md` §4.6:
/// - FIXED: `base`
/// - EXPONENTIAL: `min(base * 2^attempt, max_cap)`
/// - JITTER: `min(base * 2^attempt, max_cap) + uniform(0, 0.5 * base * 2^attempt)`
pub fn next_delay(
    attempt: u32,
    policy: RetryPolicyKind,
    base: Duration,
    jitter: &impl JitterSource,
) -> Duration {
    next_delay_capped(attempt, policy, base, DEFAULT_MAX_CAP, jitter)
}

/// Same as [`next_delay`] but with an explicit cap, for tests and for
/// operators who want a shorter ceiling than the one-hour default.
pub fn next_delay_capped(
    attempt: u32,
    policy: RetryPolicyKind,
    base: Duration,
    max_cap: Duration,
    jitter: &impl JitterSource,
) -> Duration {
    match policy {
        RetryPolicyKind::Fixed => base,
        RetryPolicyKind::Exponential => exponential(attempt, base, max_cap),
        RetryPolicyKind::Jitter => {
            let capped = exponential(attempt, base, max_cap);
            let raw = scale(base, attempt);
            let jitter_max = raw.mul_f64(0.5);
            capped + jitter.uniform(jitter_max)
        }
    }
}

fn scale(base: Duration, attempt: u32) -> Duration {
    // 2^attempt, saturating rather than panicking on overflow for pathological attempt counts.
    let factor = 1u32.checked_shl(attempt.min(31)).unwrap_or(u32::MAX);
    base.saturating_mul(factor)
}

fn exponential(attempt: u32, base: Duration, max_cap: Duration) -> Duration {
    scale(base, attempt).min(max_cap)
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
