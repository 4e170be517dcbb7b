// SPDX-License-Identifier: MIT

use crate::{JobId, WorkerId};
use std::str::FromStr;

#[test]
fn new_ids_are_unique() {
    assert_ne!(JobId::new(), JobId::new());
}

#[test]
fn round_trips_through_display_and_parse() {
    let id = JobId::new();
    let parsed = JobId::from_str(&id.to_string()).unwrap_or_else(|e| panic!("parse: {e}"));
    assert_eq!(id, parsed);
}

#[test]
fn distinct_id_types_do_not_compare() {
    let job = JobId::new();
    let worker = WorkerId::new();
    assert_ne!(job.to_string(), worker.to_string());
}

#[test]
fn rejects_malformed_text() {
    assert!(JobId::parse("not-a-uuid").is_err());
}
