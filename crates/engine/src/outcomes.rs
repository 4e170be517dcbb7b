// SPDX-License-Identifier: MIT

//! Job-outcome application: the Store/Broker mutations behind `spec.md`
//! §4.8 execution steps (i), (iv)-(v) and the §4.6 retry policy they drive.
//!
//! Factored out of [`crate::worker_runtime::WorkerRuntime`] so the same
//! logic backs both an in-process worker (driving these calls directly
//! against a local [`DurableStore`]/[`QueueBroker`] pair) and `orc-daemon`'s
//! IPC listener (driving them on behalf of a remote worker that only ever
//! reports outcomes, never touches Store rows itself).

use orc_broker::QueueBroker;
use orc_core::{next_delay, Clock, Job, JobId, JobStatus, ThreadRngJitter, WorkerId};
use orc_storage::{DurableStore, JobStatusUpdate};

use crate::error::EngineError;

/// `spec.md` §4.8 step (i): CAS SCHEDULED -> RUNNING for `worker_id`. A
/// `Conflict` here means someone else (the Heartbeat Monitor's reclaim, an
/// operator cancel) already moved the job; the caller should ack the broker
/// entry and abandon, not retry.
pub async fn claim_job<S: DurableStore, C: Clock>(
    store: &S,
    clock: &C,
    job_id: JobId,
    worker_id: WorkerId,
) -> Result<Job, EngineError> {
    let now = clock.now();
    let update = JobStatusUpdate { next: Some(JobStatus::Running), worker_id: Some(Some(worker_id)), ..Default::default() };
    store.update_job_status(job_id, JobStatus::Scheduled, update, now).await.map_err(Into::into)
}

/// `spec.md` §4.8 step (iv): RUNNING -> SUCCESS with the handler's result.
pub async fn report_success<S: DurableStore, C: Clock>(
    store: &S,
    clock: &C,
    job_id: JobId,
    result: serde_json::Value,
) -> Result<Job, EngineError> {
    let now = clock.now();
    let update = JobStatusUpdate { next: Some(JobStatus::Success), result: Some(Some(result)), ..Default::default() };
    store.update_job_status(job_id, JobStatus::Running, update, now).await.map_err(Into::into)
}

/// `spec.md` §4.8 step (ii): unknown `job_type`, RUNNING -> FAILED(UNKNOWN_TYPE),
/// never retried.
pub async fn report_unknown_type<S: DurableStore, C: Clock>(store: &S, clock: &C, job_id: JobId) -> Result<Job, EngineError> {
    let now = clock.now();
    let update = JobStatusUpdate {
        next: Some(JobStatus::Failed),
        error_message: Some(Some("UNKNOWN_TYPE".to_string())),
        ..Default::default()
    };
    store.update_job_status(job_id, JobStatus::Running, update, now).await.map_err(Into::into)
}

/// `spec.md` §4.8 step (v) + §4.6: RUNNING -> FAILED, then either
/// FAILED -> RETRYING -> PENDING with a fresh `scheduled_at`, or
/// FAILED -> DEAD plus a DLQ entry, depending on whether retries remain.
/// The attempt counter increments exactly once, on this path only.
pub async fn report_failure<S: DurableStore, B: QueueBroker, C: Clock>(
    store: &S,
    broker: &B,
    clock: &C,
    job_id: JobId,
    reason: String,
) -> Result<Job, EngineError> {
    let now = clock.now();
    let failed_update = JobStatusUpdate { next: Some(JobStatus::Failed), error_message: Some(Some(reason)), ..Default::default() };
    let failed = store.update_job_status(job_id, JobStatus::Running, failed_update, now).await?;

    if failed.attempt + 1 < failed.max_attempts {
        let jitter = ThreadRngJitter;
        let delay = next_delay(failed.attempt, failed.retry_policy, failed.base_delay, &jitter);
        let next_attempt = failed.attempt + 1;
        let scheduled_at = now + chrono::Duration::from_std(delay).unwrap_or(chrono::Duration::zero());

        store.update_job_status(job_id, JobStatus::Failed, JobStatusUpdate::to(JobStatus::Retrying), now).await?;
        let pending_update = JobStatusUpdate {
            next: Some(JobStatus::Pending),
            attempt: Some(next_attempt),
            scheduled_at: Some(scheduled_at),
            ..Default::default()
        };
        store.update_job_status(job_id, JobStatus::Retrying, pending_update, now).await.map_err(Into::into)
    } else {
        let dead_update = JobStatusUpdate { next: Some(JobStatus::Dead), attempt: Some(failed.attempt + 1), ..Default::default() };
        let dead = store.update_job_status(job_id, JobStatus::Failed, dead_update, now).await?;
        broker.send_to_dlq(job_id, "max attempts exhausted".to_string()).await?;
        Ok(dead)
    }
}

#[cfg(test)]
#[path = "outcomes_tests.rs"]
mod tests;
