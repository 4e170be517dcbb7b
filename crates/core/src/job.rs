// SPDX-License-Identifier: MIT

//! Job identifier, status, and the legal-transition state machine (`spec.md` §3, §4.3).

use crate::id::define_id;
use crate::retry::RetryPolicyKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

define_id! {
    /// Unique identifier for a job instance. Opaque 128-bit (v4 UUID).
    pub struct JobId;
}

define_id! {
    /// Unique identifier for a workflow instance.
    pub struct WorkflowId;
}

/// Status of a job. Legal transitions are enumerated in [`JobStatus::can_transition_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Scheduled,
    Running,
    Success,
    Failed,
    Retrying,
    Dead,
    Canceled,
}

crate::simple_display! {
    JobStatus {
        Pending => "pending",
        Scheduled => "scheduled",
        Running => "running",
        Success => "success",
        Failed => "failed",
        Retrying => "retrying",
        Dead => "dead",
        Canceled => "canceled",
    }
}

impl JobStatus {
    /// True for states from which no further transition is legal.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Dead | JobStatus::Canceled)
    }

    /// Whether `worker_id` is expected to be set for a job in this status.
    ///
    /// Invariant (`spec.md` §3): worker_id is non-null iff status is
    /// SCHEDULED or RUNNING.
    pub fn expects_worker(self) -> bool {
        matches!(self, JobStatus::Scheduled | JobStatus::Running)
    }

    /// The exhaustive legal-transition table from `spec.md` §4.3.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, next),
            (Pending, Scheduled)
                | (Pending, Canceled)
                | (Scheduled, Running)
                | (Scheduled, Canceled)
                | (Scheduled, Pending)
                | (Running, Success)
                | (Running, Failed)
                | (Running, Canceled)
                | (Running, Pending)
                | (Failed, Retrying)
                | (Failed, Dead)
                | (Retrying, Pending)
        )
    }
}

/// Error returned when an attempted transition is not in the `spec.md` §4.3 table.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid transition: {from} -> {to}")]
pub struct InvalidTransition {
    pub from: JobStatus,
    pub to: JobStatus,
}

/// Configuration accepted at job creation time (`spec.md` §6 create-job).
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub job_type: String,
    pub payload: serde_json::Value,
    pub idempotency_key: String,
    pub priority: u8,
    pub max_attempts: u32,
    pub timeout: std::time::Duration,
    pub retry_policy: RetryPolicyKind,
    pub base_delay: std::time::Duration,
    pub scheduled_at: DateTime<Utc>,
    pub workflow_id: Option<WorkflowId>,
}

impl JobConfig {
    pub fn builder(job_type: impl Into<String>, idempotency_key: impl Into<String>) -> JobConfigBuilder {
        JobConfigBuilder {
            job_type: job_type.into(),
            payload: serde_json::Value::Null,
            idempotency_key: idempotency_key.into(),
            priority: 5,
            max_attempts: 3,
            timeout: std::time::Duration::from_secs(3600),
            retry_policy: RetryPolicyKind::Exponential,
            base_delay: std::time::Duration::from_secs(1),
            scheduled_at: None,
            workflow_id: None,
        }
    }
}

pub struct JobConfigBuilder {
    job_type: String,
    payload: serde_json::Value,
    idempotency_key: String,
    priority: u8,
    max_attempts: u32,
    timeout: std::time::Duration,
    retry_policy: RetryPolicyKind,
    base_delay: std::time::Duration,
    scheduled_at: Option<DateTime<Utc>>,
    workflow_id: Option<WorkflowId>,
}

impl JobConfigBuilder {
    crate::setters! {
        set {
            payload: serde_json::Value,
            priority: u8,
            max_attempts: u32,
            timeout: std::time::Duration,
            retry_policy: RetryPolicyKind,
            base_delay: std::time::Duration,
        }
        option {
            scheduled_at: DateTime<Utc>,
            workflow_id: WorkflowId,
        }
    }

    pub fn build(self, now: DateTime<Utc>) -> JobConfig {
        JobConfig {
            job_type: self.job_type,
            payload: self.payload,
            idempotency_key: self.idempotency_key,
            priority: self.priority,
            max_attempts: self.max_attempts,
            timeout: self.timeout,
            retry_policy: self.retry_policy,
            base_delay: self.base_delay,
            scheduled_at: self.scheduled_at.unwrap_or(now),
            workflow_id: self.workflow_id,
        }
    }
}

/// A job row (`spec.md` §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub job_type: String,
    pub payload: serde_json::Value,
    pub priority: u8,
    pub idempotency_key: String,
    pub scheduled_at: DateTime<Utc>,
    pub status: JobStatus,
    pub attempt: u32,
    pub max_attempts: u32,
    pub retry_policy: RetryPolicyKind,
    pub base_delay: std::time::Duration,
    pub timeout: std::time::Duration,
    pub worker_id: Option<crate::worker::WorkerId>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub error_detail: Option<String>,
    pub result: Option<serde_json::Value>,
    pub workflow_id: Option<WorkflowId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a new job in status PENDING with attempt 0.
    pub fn new(config: JobConfig, now: DateTime<Utc>) -> Self {
        Self {
            id: JobId::new(),
            job_type: config.job_type,
            payload: config.payload,
            priority: config.priority,
            idempotency_key: config.idempotency_key,
            scheduled_at: config.scheduled_at,
            status: JobStatus::Pending,
            attempt: 0,
            max_attempts: config.max_attempts,
            retry_policy: config.retry_policy,
            base_delay: config.base_delay,
            timeout: config.timeout,
            worker_id: None,
            started_at: None,
            completed_at: None,
            error_message: None,
            error_detail: None,
            result: None,
            workflow_id: config.workflow_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Total scheduling order key from `spec.md` §4.5: (priority DESC,
    /// scheduled_at ASC, created_at ASC, job_id ASC).
    pub fn scheduling_key(&self) -> (std::cmp::Reverse<u8>, DateTime<Utc>, DateTime<Utc>, JobId) {
        (std::cmp::Reverse(self.priority), self.scheduled_at, self.created_at, self.id)
    }

    /// Whether this job has exhausted its retry budget (used by §4.6/§4.7 to
    /// decide RETRYING vs DEAD).
    pub fn retries_exhausted(&self) -> bool {
        self.attempt + 1 >= self.max_attempts
    }

    /// Apply a status transition in place, enforcing `spec.md` §4.3 legality
    /// and the §3 invariants on `worker_id`/`started_at`/`completed_at`.
    ///
    /// Callers that need compare-and-set semantics against a stored row
    /// (the Durable Store) check the *current* status matches their expected
    /// value before calling this; this method only checks the *transition*
    /// is legal, it does not re-check who else may have raced it.
    pub fn apply_transition(&mut self, next: JobStatus, now: DateTime<Utc>) -> Result<(), InvalidTransition> {
        if !self.status.can_transition_to(next) {
            return Err(InvalidTransition { from: self.status, to: next });
        }
        self.status = next;
        self.updated_at = now;

        if next == JobStatus::Running && self.started_at.is_none() {
            self.started_at = Some(now);
        }
        if !next.expects_worker() {
            self.worker_id = None;
        }
        if next.is_terminal() {
            self.completed_at = Some(now);
        }
        // Reclaiming back to PENDING clears worker/started_at (spec.md §4.7).
        if next == JobStatus::Pending {
            self.worker_id = None;
            self.started_at = None;
        }
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
crate::builder! {
    pub struct JobBuilder => Job {
        into {
            job_type: String = "test",
            idempotency_key: String = "test-key",
        }
        set {
            id: JobId = JobId::new(),
            payload: serde_json::Value = serde_json::Value::Null,
            priority: u8 = 5,
            scheduled_at: DateTime<Utc> = Utc::now(),
            status: JobStatus = JobStatus::Pending,
            attempt: u32 = 0,
            max_attempts: u32 = 3,
            retry_policy: RetryPolicyKind = RetryPolicyKind::Fixed,
            base_delay: std::time::Duration = std::time::Duration::from_secs(1),
            timeout: std::time::Duration = std::time::Duration::from_secs(60),
            worker_id: Option<crate::worker::WorkerId> = None,
            started_at: Option<DateTime<Utc>> = None,
            completed_at: Option<DateTime<Utc>> = None,
            error_message: Option<String> = None,
            error_detail: Option<String> = None,
            result: Option<serde_json::Value> = None,
            workflow_id: Option<WorkflowId> = None,
            created_at: DateTime<Utc> = Utc::now(),
            updated_at: DateTime<Utc> = Utc::now(),
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
