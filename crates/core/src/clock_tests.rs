// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn fake_clock_advances_monotonically() {
    let clock = FakeClock::new();
    let t0 = clock.now();
    clock.advance(Duration::from_secs(30));
    let t1 = clock.now();
    assert!(t1 > t0);
    assert_eq!((t1 - t0).num_seconds(), 30);
}

#[test]
fn fake_clock_can_be_set_directly() {
    let clock = FakeClock::new();
    let target = DateTime::UNIX_EPOCH + chrono::Duration::days(1);
    clock.set(target);
    assert_eq!(clock.now(), target);
}

#[test]
fn system_clock_moves_forward() {
    let clock = SystemClock;
    let t0 = clock.now();
    std::thread::sleep(Duration::from_millis(5));
    let t1 = clock.now();
    assert!(t1 >= t0);
}
