// SPDX-License-Identifier: MIT

use super::*;
use crate::clock::FakeClock;

#[test]
fn doubles_delay_each_attempt_until_max() {
    let clock = FakeClock::new();
    let mut backoff = Backoff::new(clock, Duration::from_secs(60), Duration::from_millis(100), Duration::from_secs(1));
    assert_eq!(backoff.next(), BackoffStep::Retry(Duration::from_millis(100)));
    assert_eq!(backoff.next(), BackoffStep::Retry(Duration::from_millis(200)));
    assert_eq!(backoff.next(), BackoffStep::Retry(Duration::from_millis(400)));
    assert_eq!(backoff.next(), BackoffStep::Retry(Duration::from_millis(800)));
    assert_eq!(backoff.next(), BackoffStep::Retry(Duration::from_secs(1)));
}

#[test]
fn exhausts_once_deadline_elapses() {
    let clock = FakeClock::new();
    let mut backoff = Backoff::new(clock.clone(), Duration::from_secs(5), Duration::from_millis(100), Duration::from_secs(1));
    assert!(!backoff.is_exhausted());
    clock.advance(Duration::from_secs(6));
    assert!(backoff.is_exhausted());
    assert_eq!(backoff.next(), BackoffStep::Exhausted);
}
