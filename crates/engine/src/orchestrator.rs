// SPDX-License-Identifier: MIT

//! The Orchestrator facade: validates and executes the `spec.md` §6 external
//! interface operations against a [`DurableStore`] and [`QueueBroker`] pair.
//!
//! The HTTP surface that would bind request bodies to these calls is out of
//! scope (`spec.md` §1); this facade is the thing such an adapter — or, in
//! this workspace, `orc-cli`'s local/dev mode — calls directly.

use chrono::{DateTime, Utc};
use orc_core::dto::{
    AttachJobToWorkflowRequest, CreateJobRequest, CreateWorkflowRequest, QueueStats, RegisterWorkerRequest,
    SendHeartbeatRequest, WorkflowStatusResponse,
};
use orc_core::{
    aggregate_status, Clock, Job, JobConfig, JobId, OrchestratorError, Worker, WorkerId, Workflow, WorkflowId,
};
use orc_broker::QueueBroker;
use orc_storage::DurableStore;
use std::sync::Arc;
use std::time::Duration;

pub struct Orchestrator<S, B, C> {
    store: Arc<S>,
    broker: Arc<B>,
    clock: C,
}

impl<S, B, C> Orchestrator<S, B, C>
where
    S: DurableStore,
    B: QueueBroker,
    C: Clock,
{
    pub fn new(store: Arc<S>, broker: Arc<B>, clock: C) -> Self {
        Self { store, broker, clock }
    }

    /// create-job (`spec.md` §6): applies defaults, validates the request,
    /// then inserts. Fails with `Validation` or `DuplicateIdempotency`.
    #[tracing::instrument(skip(self, request))]
    pub async fn create_job(&self, request: CreateJobRequest) -> Result<Job, OrchestratorError> {
        let now = self.clock.now();
        let config = validate_create_job(request, now)?;
        let job = Job::new(config, now);
        self.store.insert_job(job).await.map_err(Into::into)
    }

    pub async fn get_job(&self, id: JobId) -> Result<Job, OrchestratorError> {
        self.store.get_job(id).await.map_err(Into::into)
    }

    /// cancel-job (`spec.md` §6): legal from any non-terminal status.
    pub async fn cancel_job(&self, id: JobId) -> Result<Job, OrchestratorError> {
        let now = self.clock.now();
        self.store.cancel_job(id, now).await.map_err(Into::into)
    }

    /// create-workflow (`spec.md` §6).
    pub async fn create_workflow(&self, request: CreateWorkflowRequest) -> Result<Workflow, OrchestratorError> {
        if request.name.trim().is_empty() {
            return Err(OrchestratorError::Validation("workflow name must not be empty".into()));
        }
        let now = self.clock.now();
        let workflow = Workflow::new(request.name, request.description, request.config, now);
        self.store.create_workflow(workflow).await.map_err(Into::into)
    }

    /// attach-job-to-workflow (`spec.md` §6). Errors `NotFound` if either id
    /// does not exist.
    pub async fn attach_job_to_workflow(&self, request: AttachJobToWorkflowRequest) -> Result<(), OrchestratorError> {
        self.store.get_workflow(request.workflow_id).await?;
        self.store.attach_job_to_workflow(request.workflow_id, request.job_id).await.map_err(Into::into)
    }

    /// get-workflow-status (`spec.md` §4.9, §6).
    pub async fn get_workflow_status(&self, workflow_id: WorkflowId) -> Result<WorkflowStatusResponse, OrchestratorError> {
        self.store.get_workflow(workflow_id).await?;
        let jobs = self.store.list_jobs_for_workflow(workflow_id).await?;
        let (status, counts) = aggregate_status(jobs.into_iter().map(|job| job.status));
        Ok(WorkflowStatusResponse { status, counts })
    }

    /// register-worker (`spec.md` §6).
    pub async fn register_worker(&self, request: RegisterWorkerRequest) -> Result<Worker, OrchestratorError> {
        let now = self.clock.now();
        let worker = Worker::register(request.hostname, request.process_id, request.version, request.max_concurrent_jobs, now);
        self.store.upsert_worker(worker).await.map_err(Into::into)
    }

    /// send-heartbeat (`spec.md` §6). Telemetry is stored but never consulted
    /// by control decisions.
    pub async fn send_heartbeat(&self, request: SendHeartbeatRequest) -> Result<Worker, OrchestratorError> {
        let now = self.clock.now();
        self.store.touch_worker_heartbeat(request.worker_id, now, request.telemetry).await.map_err(Into::into)
    }

    pub async fn list_active_workers(&self) -> Result<Vec<Worker>, OrchestratorError> {
        self.store.list_active_workers().await.map_err(Into::into)
    }

    /// get-queue-stats (`spec.md` §6).
    pub async fn get_queue_stats(&self) -> Result<QueueStats, OrchestratorError> {
        let stats = self.broker.get_queue_stats().await.map_err(|e| OrchestratorError::Unavailable(e.to_string()))?;
        Ok(QueueStats { ready_len: stats.ready_len, dlq_len: stats.dlq_len })
    }

    /// purge-queue (`spec.md` §6): operator-only, clears only the Broker's
    /// ready collection — never touches the Store.
    pub async fn purge_queue(&self) -> Result<(), OrchestratorError> {
        self.broker.purge().await.map_err(|e| OrchestratorError::Unavailable(e.to_string()))
    }

    pub async fn deregister_worker(&self, worker_id: WorkerId) -> Result<(), OrchestratorError> {
        let now = self.clock.now();
        self.store.deregister_worker(worker_id, now).await.map_err(Into::into)
    }
}

/// Apply request defaults and reject malformed create-job requests
/// (`spec.md` §6): non-empty type/idempotency key, priority in 0..=10,
/// max_attempts >= 1, scheduled_at (if given) not before submission time.
fn validate_create_job(request: CreateJobRequest, now: DateTime<Utc>) -> Result<JobConfig, OrchestratorError> {
    if request.job_type.trim().is_empty() {
        return Err(OrchestratorError::Validation("job type must not be empty".into()));
    }
    if request.idempotency_key.trim().is_empty() {
        return Err(OrchestratorError::Validation("idempotency_key must not be empty".into()));
    }
    if request.priority > 10 {
        return Err(OrchestratorError::Validation("priority must be in 0..=10".into()));
    }
    if request.max_attempts < 1 {
        return Err(OrchestratorError::Validation("max_attempts must be >= 1".into()));
    }
    if let Some(scheduled_at) = request.scheduled_at {
        if scheduled_at < now {
            return Err(OrchestratorError::Validation("scheduled_at must not be before submission time".into()));
        }
    }

    let mut builder = JobConfig::builder(request.job_type, request.idempotency_key)
        .payload(request.payload)
        .priority(request.priority)
        .max_attempts(request.max_attempts)
        .timeout(Duration::from_secs(request.timeout_secs))
        .retry_policy(request.retry_policy);
    if let Some(base_delay_secs) = request.base_delay_secs {
        builder = builder.base_delay(Duration::from_secs(base_delay_secs));
    }
    if let Some(scheduled_at) = request.scheduled_at {
        builder = builder.scheduled_at(scheduled_at);
    }
    if let Some(workflow_id) = request.workflow_id {
        builder = builder.workflow_id(workflow_id);
    }
    Ok(builder.build(now))
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
