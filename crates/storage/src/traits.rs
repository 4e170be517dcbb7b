// SPDX-License-Identifier: MIT

//! The Durable Store contract (`spec.md` §4.1, §4.5).
//!
//! A real deployment backs this with a transactional relational database
//! (row-level locking via `SELECT ... FOR UPDATE SKIP LOCKED` for claims,
//! as in Postgres). [`crate::memory::InMemoryStore`] is a single-process
//! reference implementation used by tests and by `orc-daemon` when run
//! without an external database.

use crate::error::StoreResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use orc_core::{DependencyEdge, Job, JobId, JobStatus, Worker, WorkerId, Workflow, WorkflowId};
use std::time::Duration;

/// Partial update applied to a job row as part of a status transition.
///
/// Every field besides `next` is `None` by default, meaning "leave as
/// [`orc_core::Job::apply_transition`] computes it". Callers set only the
/// fields their transition actually changes (e.g. a FAILED -> RETRYING
/// transition sets `error_message`/`error_detail` and bumps `attempt`).
#[derive(Debug, Clone, Default)]
pub struct JobStatusUpdate {
    pub next: Option<JobStatus>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub attempt: Option<u32>,
    pub worker_id: Option<Option<WorkerId>>,
    pub error_message: Option<Option<String>>,
    pub error_detail: Option<Option<String>>,
    pub result: Option<Option<serde_json::Value>>,
}

impl JobStatusUpdate {
    pub fn to(next: JobStatus) -> Self {
        Self { next: Some(next), ..Default::default() }
    }
}

/// Outcome of reassigning the in-flight jobs owned by a dead worker
/// (`spec.md` §4.7(b)).
#[derive(Debug, Clone, Default)]
pub struct ReassignmentReport {
    /// Jobs requeued to PENDING with a fresh `scheduled_at`.
    pub requeued: Vec<JobId>,
    /// Jobs that had exhausted their retry budget and moved to DEAD.
    pub dead_lettered: Vec<JobId>,
}

/// Aggregate counters surfaced by the operator CLI and `/queue/stats`
/// (`spec.md` §6).
#[derive(Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize)]
pub struct StoreStats {
    pub pending: usize,
    pub scheduled: usize,
    pub running: usize,
    pub success: usize,
    pub failed: usize,
    pub retrying: usize,
    pub dead: usize,
    pub canceled: usize,
}

#[async_trait]
pub trait DurableStore: Send + Sync {
    async fn insert_job(&self, job: Job) -> StoreResult<Job>;
    async fn get_job(&self, id: JobId) -> StoreResult<Job>;
    async fn cancel_job(&self, id: JobId, now: DateTime<Utc>) -> StoreResult<Job>;

    /// Compare-and-set a job's status, failing with `Conflict` if the stored
    /// row is not currently in `expected`. `update` carries any additional
    /// fields the transition sets (error, result, new `scheduled_at`, etc).
    async fn update_job_status(
        &self,
        id: JobId,
        expected: JobStatus,
        update: JobStatusUpdate,
        now: DateTime<Utc>,
    ) -> StoreResult<Job>;

    /// Atomically select and claim up to `limit` ready PENDING jobs in
    /// scheduling order (`spec.md` §4.5), transitioning them to SCHEDULED.
    /// "Ready" excludes jobs with an unsatisfied dependency (`spec.md` §4.4)
    /// and jobs whose `scheduled_at` is in the future.
    async fn claim_ready_jobs(&self, limit: usize, now: DateTime<Utc>) -> StoreResult<Vec<Job>>;

    /// PENDING jobs abandoned mid-claim: SCHEDULED rows whose `updated_at`
    /// predates `now - grace`, meaning the broker enqueue after the claim
    /// never completed (`spec.md` §4.5 edge case). Reverts them to PENDING.
    async fn sweep_orphan_scheduled(&self, grace: Duration, now: DateTime<Utc>) -> StoreResult<Vec<JobId>>;

    async fn list_jobs_for_workflow(&self, workflow_id: WorkflowId) -> StoreResult<Vec<Job>>;
    async fn list_dead_letter_jobs(&self) -> StoreResult<Vec<Job>>;
    async fn stats(&self) -> StoreResult<StoreStats>;

    /// All PENDING jobs regardless of readiness, for the Dependency
    /// Resolver's read-only inspection queries (`spec.md` §4.4). Distinct
    /// from `claim_ready_jobs`, which is the mutating, lock-taking path the
    /// Scheduler uses; this is a plain snapshot read.
    async fn list_pending_jobs(&self) -> StoreResult<Vec<Job>>;

    async fn create_workflow(&self, workflow: Workflow) -> StoreResult<Workflow>;
    async fn get_workflow(&self, id: WorkflowId) -> StoreResult<Workflow>;
    async fn attach_job_to_workflow(&self, workflow_id: WorkflowId, job_id: JobId) -> StoreResult<()>;

    /// Predecessors of `job_id` (jobs it depends on), not dependents.
    async fn list_dependencies_of(&self, job_id: JobId) -> StoreResult<Vec<JobId>>;

    /// Insert a dependency edge, rejecting it with `CycleDetected` if it
    /// would close a cycle (`spec.md` §4.4).
    async fn insert_dependency(&self, edge: DependencyEdge) -> StoreResult<()>;

    async fn upsert_worker(&self, worker: Worker) -> StoreResult<Worker>;
    async fn touch_worker_heartbeat(
        &self,
        worker_id: WorkerId,
        now: DateTime<Utc>,
        telemetry: orc_core::WorkerTelemetry,
    ) -> StoreResult<Worker>;
    async fn list_active_workers(&self) -> StoreResult<Vec<Worker>>;
    async fn list_stale_workers(&self, now: DateTime<Utc>, threshold: Duration) -> StoreResult<Vec<Worker>>;
    async fn mark_worker_stale(&self, worker_id: WorkerId) -> StoreResult<()>;

    /// Mark a worker STOPPED (graceful shutdown). Its `last_heartbeat` then
    /// serves as the stopped-since marker consulted by
    /// [`DurableStore::remove_stopped_workers`].
    async fn deregister_worker(&self, worker_id: WorkerId, now: DateTime<Utc>) -> StoreResult<()>;

    /// Remove worker records STOPPED longer than `window` (`spec.md` §4.7(d)).
    async fn remove_stopped_workers(&self, now: DateTime<Utc>, window: Duration) -> StoreResult<Vec<WorkerId>>;

    /// Reassign the in-flight jobs (SCHEDULED/RUNNING) owned by `worker_id`
    /// per `spec.md` §4.7(b): requeue to PENDING if retries remain, else
    /// DEAD. Callers push the returned `dead_lettered` jobs onto the
    /// broker's dead-letter queue.
    async fn reassign_jobs_of_worker(&self, worker_id: WorkerId, now: DateTime<Utc>) -> StoreResult<ReassignmentReport>;
}
