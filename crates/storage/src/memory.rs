// SPDX-License-Identifier: MIT

//! In-memory reference implementation of [`DurableStore`].
//!
//! A single `parking_lot::Mutex` around the whole inner state stands in for
//! a database transaction: every method takes the lock for the duration of
//! its read-modify-write, so claims and CAS updates are atomic the same way
//! a Postgres `SELECT ... FOR UPDATE SKIP LOCKED` transaction is atomic.
//! This does not model lock contention or partial failure — a real backend
//! earns those properties from the database instead of faking them here.

use crate::error::{StoreError, StoreResult};
use crate::traits::{DurableStore, JobStatusUpdate, ReassignmentReport, StoreStats};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use orc_core::{
    next_delay, DependencyEdge, Job, JobId, JobStatus, ThreadRngJitter, Worker, WorkerId, WorkerStatus, WorkerTelemetry,
    Workflow, WorkflowId,
};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

#[derive(Default)]
struct Inner {
    jobs: HashMap<JobId, Job>,
    idempotency_index: HashMap<String, JobId>,
    workflows: HashMap<WorkflowId, Workflow>,
    workflow_jobs: HashMap<WorkflowId, Vec<JobId>>,
    /// `job_id -> set of job_ids it depends on`.
    dependencies: HashMap<JobId, HashSet<JobId>>,
    workers: HashMap<WorkerId, Worker>,
}

/// Single-process [`DurableStore`] backed by in-memory maps under one lock.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Depth-first search for a path `from -> ... -> to` in the dependency
    /// graph, used to reject edges that would close a cycle.
    fn reaches(inner: &Inner, from: JobId, to: JobId) -> bool {
        let mut stack = vec![from];
        let mut seen = HashSet::new();
        while let Some(node) = stack.pop() {
            if node == to {
                return true;
            }
            if !seen.insert(node) {
                continue;
            }
            if let Some(deps) = inner.dependencies.get(&node) {
                stack.extend(deps.iter().copied());
            }
        }
        false
    }

    fn is_ready(inner: &Inner, job: &Job, now: DateTime<Utc>) -> bool {
        if job.scheduled_at > now {
            return false;
        }
        match inner.dependencies.get(&job.id) {
            None => true,
            Some(deps) => deps.iter().all(|dep_id| {
                inner.jobs.get(dep_id).map(|dep| dep.status == JobStatus::Success).unwrap_or(false)
            }),
        }
    }
}

#[async_trait]
impl DurableStore for InMemoryStore {
    #[tracing::instrument(skip(self, job), fields(job_id = %job.id))]
    async fn insert_job(&self, job: Job) -> StoreResult<Job> {
        let mut inner = self.inner.lock();
        if inner.idempotency_index.contains_key(&job.idempotency_key) {
            return Err(StoreError::DuplicateIdempotency);
        }
        inner.idempotency_index.insert(job.idempotency_key.clone(), job.id);
        if let Some(workflow_id) = job.workflow_id {
            inner.workflow_jobs.entry(workflow_id).or_default().push(job.id);
        }
        inner.jobs.insert(job.id, job.clone());
        Ok(job)
    }

    #[tracing::instrument(skip(self))]
    async fn get_job(&self, id: JobId) -> StoreResult<Job> {
        self.inner.lock().jobs.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    #[tracing::instrument(skip(self))]
    async fn cancel_job(&self, id: JobId, now: DateTime<Utc>) -> StoreResult<Job> {
        let mut inner = self.inner.lock();
        let job = inner.jobs.get_mut(&id).ok_or(StoreError::NotFound)?;
        if job.status.is_terminal() {
            return Err(StoreError::Conflict { expected: JobStatus::Pending, actual: job.status });
        }
        job.apply_transition(JobStatus::Canceled, now)?;
        Ok(job.clone())
    }

    #[tracing::instrument(skip(self, update))]
    async fn update_job_status(
        &self,
        id: JobId,
        expected: JobStatus,
        update: JobStatusUpdate,
        now: DateTime<Utc>,
    ) -> StoreResult<Job> {
        let mut inner = self.inner.lock();
        let job = inner.jobs.get_mut(&id).ok_or(StoreError::NotFound)?;
        if job.status != expected {
            return Err(StoreError::Conflict { expected, actual: job.status });
        }
        if let Some(next) = update.next {
            job.apply_transition(next, now)?;
        }
        // Applied after apply_transition so an explicit worker_id (the
        // claim step assigning ownership) is not clobbered by the
        // transition's own worker_id-clearing invariant.
        if let Some(worker_id) = update.worker_id {
            job.worker_id = worker_id;
        }
        if let Some(scheduled_at) = update.scheduled_at {
            job.scheduled_at = scheduled_at;
        }
        if let Some(attempt) = update.attempt {
            job.attempt = attempt;
        }
        if let Some(error_message) = update.error_message {
            job.error_message = error_message;
        }
        if let Some(error_detail) = update.error_detail {
            job.error_detail = error_detail;
        }
        if let Some(result) = update.result {
            job.result = result;
        }
        Ok(job.clone())
    }

    #[tracing::instrument(skip(self))]
    #[allow(clippy::expect_used)]
    async fn claim_ready_jobs(&self, limit: usize, now: DateTime<Utc>) -> StoreResult<Vec<Job>> {
        let mut inner = self.inner.lock();
        let mut candidates: Vec<JobId> = inner
            .jobs
            .values()
            .filter(|job| job.status == JobStatus::Pending)
            .filter(|job| Self::is_ready(&inner, job, now))
            .map(|job| job.id)
            .collect();
        candidates.sort_by_key(|id| inner.jobs[id].scheduling_key());
        candidates.truncate(limit);

        let mut claimed = Vec::with_capacity(candidates.len());
        for id in candidates {
            let job = inner.jobs.get_mut(&id).expect("candidate collected from the same snapshot");
            job.apply_transition(JobStatus::Scheduled, now)
                .expect("PENDING -> SCHEDULED is always legal (spec.md §4.3)");
            job.worker_id = Some(orc_core::WorkerId::in_broker_sentinel());
            claimed.push(job.clone());
        }
        Ok(claimed)
    }

    #[tracing::instrument(skip(self))]
    #[allow(clippy::expect_used)]
    async fn sweep_orphan_scheduled(&self, grace: Duration, now: DateTime<Utc>) -> StoreResult<Vec<JobId>> {
        let grace = chrono::Duration::from_std(grace).unwrap_or(chrono::Duration::zero());
        let mut inner = self.inner.lock();
        let orphans: Vec<JobId> = inner
            .jobs
            .values()
            .filter(|job| job.status == JobStatus::Scheduled && now - job.updated_at > grace)
            .map(|job| job.id)
            .collect();
        for id in &orphans {
            let job = inner.jobs.get_mut(id).expect("orphan id collected from the same snapshot");
            job.apply_transition(JobStatus::Pending, now)
                .expect("SCHEDULED -> PENDING is always legal (spec.md §4.3)");
        }
        Ok(orphans)
    }

    #[tracing::instrument(skip(self))]
    async fn list_jobs_for_workflow(&self, workflow_id: WorkflowId) -> StoreResult<Vec<Job>> {
        let inner = self.inner.lock();
        let ids = inner.workflow_jobs.get(&workflow_id).cloned().unwrap_or_default();
        Ok(ids.into_iter().filter_map(|id| inner.jobs.get(&id).cloned()).collect())
    }

    #[tracing::instrument(skip(self))]
    async fn list_dead_letter_jobs(&self) -> StoreResult<Vec<Job>> {
        let inner = self.inner.lock();
        Ok(inner.jobs.values().filter(|job| job.status == JobStatus::Dead).cloned().collect())
    }

    #[tracing::instrument(skip(self))]
    async fn list_pending_jobs(&self) -> StoreResult<Vec<Job>> {
        let inner = self.inner.lock();
        Ok(inner.jobs.values().filter(|job| job.status == JobStatus::Pending).cloned().collect())
    }

    #[tracing::instrument(skip(self))]
    async fn stats(&self) -> StoreResult<StoreStats> {
        let inner = self.inner.lock();
        let mut stats = StoreStats::default();
        for job in inner.jobs.values() {
            match job.status {
                JobStatus::Pending => stats.pending += 1,
                JobStatus::Scheduled => stats.scheduled += 1,
                JobStatus::Running => stats.running += 1,
                JobStatus::Success => stats.success += 1,
                JobStatus::Failed => stats.failed += 1,
                JobStatus::Retrying => stats.retrying += 1,
                JobStatus::Dead => stats.dead += 1,
                JobStatus::Canceled => stats.canceled += 1,
            }
        }
        Ok(stats)
    }

    #[tracing::instrument(skip(self, workflow), fields(workflow_id = %workflow.id))]
    async fn create_workflow(&self, workflow: Workflow) -> StoreResult<Workflow> {
        let mut inner = self.inner.lock();
        if inner.workflows.values().any(|w| w.name == workflow.name) {
            return Err(StoreError::DuplicateName);
        }
        inner.workflows.insert(workflow.id, workflow.clone());
        Ok(workflow)
    }

    #[tracing::instrument(skip(self))]
    async fn get_workflow(&self, id: WorkflowId) -> StoreResult<Workflow> {
        self.inner.lock().workflows.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    #[tracing::instrument(skip(self))]
    async fn attach_job_to_workflow(&self, workflow_id: WorkflowId, job_id: JobId) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        if !inner.workflows.contains_key(&workflow_id) {
            return Err(StoreError::NotFound);
        }
        let job = inner.jobs.get_mut(&job_id).ok_or(StoreError::NotFound)?;
        job.workflow_id = Some(workflow_id);
        inner.workflow_jobs.entry(workflow_id).or_default().push(job_id);
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn list_dependencies_of(&self, job_id: JobId) -> StoreResult<Vec<JobId>> {
        let inner = self.inner.lock();
        Ok(inner.dependencies.get(&job_id).map(|deps| deps.iter().copied().collect()).unwrap_or_default())
    }

    #[tracing::instrument(skip(self, edge))]
    async fn insert_dependency(&self, edge: DependencyEdge) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        // edge: job_id depends on depends_on_job_id. A cycle forms if
        // depends_on_job_id can already reach job_id.
        if edge.job_id == edge.depends_on_job_id || Self::reaches(&inner, edge.depends_on_job_id, edge.job_id) {
            return Err(StoreError::CycleDetected);
        }
        inner.dependencies.entry(edge.job_id).or_default().insert(edge.depends_on_job_id);
        Ok(())
    }

    #[tracing::instrument(skip(self, worker), fields(worker_id = %worker.id))]
    async fn upsert_worker(&self, worker: Worker) -> StoreResult<Worker> {
        let mut inner = self.inner.lock();
        inner.workers.insert(worker.id, worker.clone());
        Ok(worker)
    }

    #[tracing::instrument(skip(self, telemetry))]
    async fn touch_worker_heartbeat(
        &self,
        worker_id: WorkerId,
        now: DateTime<Utc>,
        telemetry: WorkerTelemetry,
    ) -> StoreResult<Worker> {
        let mut inner = self.inner.lock();
        let worker = inner.workers.get_mut(&worker_id).ok_or(StoreError::NotFound)?;
        worker.last_heartbeat = now;
        worker.telemetry = telemetry;
        worker.status = WorkerStatus::Active;
        Ok(worker.clone())
    }

    #[tracing::instrument(skip(self))]
    async fn list_active_workers(&self) -> StoreResult<Vec<Worker>> {
        let inner = self.inner.lock();
        Ok(inner.workers.values().filter(|w| w.status != WorkerStatus::Stopped).cloned().collect())
    }

    #[tracing::instrument(skip(self))]
    async fn list_stale_workers(&self, now: DateTime<Utc>, threshold: Duration) -> StoreResult<Vec<Worker>> {
        let inner = self.inner.lock();
        Ok(inner
            .workers
            .values()
            .filter(|w| w.status == WorkerStatus::Active && w.is_stale(now, threshold))
            .cloned()
            .collect())
    }

    #[tracing::instrument(skip(self))]
    async fn mark_worker_stale(&self, worker_id: WorkerId) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        let worker = inner.workers.get_mut(&worker_id).ok_or(StoreError::NotFound)?;
        worker.status = WorkerStatus::Stale;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn deregister_worker(&self, worker_id: WorkerId, now: DateTime<Utc>) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        let worker = inner.workers.get_mut(&worker_id).ok_or(StoreError::NotFound)?;
        worker.status = WorkerStatus::Stopped;
        worker.last_heartbeat = now;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn remove_stopped_workers(&self, now: DateTime<Utc>, window: Duration) -> StoreResult<Vec<WorkerId>> {
        let window = chrono::Duration::from_std(window).unwrap_or(chrono::Duration::zero());
        let mut inner = self.inner.lock();
        let stopped: Vec<WorkerId> = inner
            .workers
            .values()
            .filter(|w| w.status == WorkerStatus::Stopped && now - w.last_heartbeat > window)
            .map(|w| w.id)
            .collect();
        for id in &stopped {
            inner.workers.remove(id);
        }
        Ok(stopped)
    }

    #[tracing::instrument(skip(self))]
    #[allow(clippy::expect_used)]
    async fn reassign_jobs_of_worker(&self, worker_id: WorkerId, now: DateTime<Utc>) -> StoreResult<ReassignmentReport> {
        let mut inner = self.inner.lock();
        let owned: Vec<JobId> = inner
            .jobs
            .values()
            .filter(|job| job.worker_id == Some(worker_id) && !job.status.is_terminal())
            .map(|job| job.id)
            .collect();

        let mut report = ReassignmentReport::default();
        let jitter = ThreadRngJitter;
        for id in owned {
            let job = inner.jobs.get_mut(&id).expect("owned id collected from the same snapshot");
            if job.retries_exhausted() {
                // A crashed worker never reported success; walk the job
                // through RUNNING so the legal-transition table (spec.md
                // §4.3) still applies whether it was SCHEDULED or RUNNING.
                if job.status == JobStatus::Scheduled {
                    job.apply_transition(JobStatus::Running, now)
                        .expect("SCHEDULED -> RUNNING is always legal (spec.md §4.3)");
                }
                job.apply_transition(JobStatus::Failed, now)
                    .expect("RUNNING -> FAILED is always legal (spec.md §4.3)");
                job.attempt += 1;
                job.apply_transition(JobStatus::Dead, now)
                    .expect("FAILED -> DEAD is always legal (spec.md §4.3)");
                report.dead_lettered.push(id);
            } else {
                let delay = next_delay(job.attempt, job.retry_policy, job.base_delay, &jitter);
                job.attempt += 1;
                job.apply_transition(JobStatus::Pending, now)
                    .expect("RUNNING/SCHEDULED -> PENDING is always legal (spec.md §4.3)");
                job.scheduled_at = now + chrono::Duration::from_std(delay).unwrap_or(chrono::Duration::zero());
                report.requeued.push(id);
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
