// SPDX-License-Identifier: MIT

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

/// Proptest strategies for core state machine types.
pub mod strategies {
    use crate::job::JobStatus;
    use proptest::prelude::*;

    pub fn arb_job_status() -> impl Strategy<Value = JobStatus> {
        prop_oneof![
            Just(JobStatus::Pending),
            Just(JobStatus::Scheduled),
            Just(JobStatus::Running),
            Just(JobStatus::Success),
            Just(JobStatus::Failed),
            Just(JobStatus::Retrying),
            Just(JobStatus::Dead),
            Just(JobStatus::Canceled),
        ]
    }

    pub fn arb_priority() -> impl Strategy<Value = u8> {
        0u8..=10
    }
}

/// A job that always succeeds immediately, returning its payload verbatim.
/// Used by scenario 1 in `spec.md` §8 ("echo handler").
pub fn echo_job(idempotency_key: &str, payload: serde_json::Value) -> crate::job::JobConfig {
    crate::job::JobConfig::builder("echo", idempotency_key).payload(payload).build(chrono::Utc::now())
}
