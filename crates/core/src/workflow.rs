// SPDX-License-Identifier: MIT

//! Workflow record and status aggregation (`spec.md` §3, §4.9).

use crate::job::{JobStatus, WorkflowId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A workflow row (`spec.md` §3). Status is derived, never stored — see
/// [`aggregate_status`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub id: WorkflowId,
    pub name: String,
    pub description: String,
    pub config: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl Workflow {
    pub fn new(name: impl Into<String>, description: impl Into<String>, config: serde_json::Value, now: DateTime<Utc>) -> Self {
        Self {
            id: WorkflowId::new(),
            name: name.into(),
            description: description.into(),
            config,
            created_at: now,
        }
    }
}

/// Aggregated workflow status derived from the multiset of its jobs' statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Completed,
    Failed,
    Running,
    Pending,
}

crate::simple_display! {
    WorkflowStatus {
        Completed => "completed",
        Failed => "failed",
        Running => "running",
        Pending => "pending",
    }
}

/// Per-status counts for observability, returned alongside [`WorkflowStatus`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowCounts {
    pub pending: usize,
    pub scheduled: usize,
    pub running: usize,
    pub success: usize,
    pub failed: usize,
    pub retrying: usize,
    pub dead: usize,
    pub canceled: usize,
}

impl WorkflowCounts {
    pub fn total(&self) -> usize {
        self.pending
            + self.scheduled
            + self.running
            + self.success
            + self.failed
            + self.retrying
            + self.dead
            + self.canceled
    }

    fn record(&mut self, status: JobStatus) {
        match status {
            JobStatus::Pending => self.pending += 1,
            JobStatus::Scheduled => self.scheduled += 1,
            JobStatus::Running => self.running += 1,
            JobStatus::Success => self.success += 1,
            JobStatus::Failed => self.failed += 1,
            JobStatus::Retrying => self.retrying += 1,
            JobStatus::Dead => self.dead += 1,
            JobStatus::Canceled => self.canceled += 1,
        }
    }
}

/// Derive a workflow's status from its jobs' statuses (`spec.md` §4.9).
///
/// A workflow with zero jobs is PENDING (not vacuously COMPLETED) — nothing
/// has run yet. Not prescribed by `spec.md`; resolved here, see DESIGN.md.
///
/// Rule order matches `spec.md` precedence: DEAD anywhere marks the whole
/// workflow FAILED even if other jobs already succeeded or are still in
/// flight; otherwise any job still moving (SCHEDULED/RUNNING/RETRYING) marks
/// it RUNNING; otherwise a workflow made up of only SUCCESS and CANCELED
/// jobs is COMPLETED; anything else is PENDING.
pub fn aggregate_status(statuses: impl IntoIterator<Item = JobStatus>) -> (WorkflowStatus, WorkflowCounts) {
    let mut counts = WorkflowCounts::default();
    for status in statuses {
        counts.record(status);
    }

    if counts.total() == 0 {
        return (WorkflowStatus::Pending, counts);
    }
    if counts.dead > 0 {
        return (WorkflowStatus::Failed, counts);
    }
    if counts.scheduled > 0 || counts.running > 0 || counts.retrying > 0 {
        return (WorkflowStatus::Running, counts);
    }
    if counts.success + counts.canceled == counts.total() {
        return (WorkflowStatus::Completed, counts);
    }
    (WorkflowStatus::Pending, counts)
}

#[cfg(any(test, feature = "test-support"))]
crate::builder! {
    pub struct WorkflowBuilder => Workflow {
        into {
            name: String = "test-workflow",
            description: String = "",
        }
        set {
            id: WorkflowId = WorkflowId::new(),
            config: serde_json::Value = serde_json::Value::Null,
            created_at: DateTime<Utc> = Utc::now(),
        }
    }
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
