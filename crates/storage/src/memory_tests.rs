// SPDX-License-Identifier: MIT

use super::*;
use orc_core::{DependencyEdge, Job, JobConfig, JobStatus, Worker, WorkerStatus};

fn echo_config() -> JobConfig {
    JobConfig::builder("echo", "key-1").build(Utc::now())
}

#[tokio::test]
async fn insert_rejects_duplicate_idempotency_key() {
    let store = InMemoryStore::new();
    let now = Utc::now();
    store.insert_job(Job::new(echo_config(), now)).await.unwrap();
    let err = store.insert_job(Job::new(echo_config(), now)).await.unwrap_err();
    assert!(matches!(err, StoreError::DuplicateIdempotency));
}

#[tokio::test]
async fn claim_ready_jobs_respects_scheduling_order() {
    let store = InMemoryStore::new();
    let now = Utc::now();
    let low = Job::builder().idempotency_key("low").priority(1).scheduled_at(now).created_at(now).build();
    let high = Job::builder().idempotency_key("high").priority(9).scheduled_at(now).created_at(now).build();
    store.insert_job(low.clone()).await.unwrap();
    store.insert_job(high.clone()).await.unwrap();

    let claimed = store.claim_ready_jobs(10, now).await.unwrap();
    assert_eq!(claimed.len(), 2);
    assert_eq!(claimed[0].id, high.id);
    assert!(claimed.iter().all(|j| j.status == JobStatus::Scheduled));
}

#[tokio::test]
async fn claim_ready_jobs_skips_future_scheduled_at() {
    let store = InMemoryStore::new();
    let now = Utc::now();
    let future = Job::builder().idempotency_key("future").scheduled_at(now + chrono::Duration::hours(1)).build();
    store.insert_job(future).await.unwrap();

    let claimed = store.claim_ready_jobs(10, now).await.unwrap();
    assert!(claimed.is_empty());
}

#[tokio::test]
async fn claim_ready_jobs_skips_jobs_with_unsatisfied_dependency() {
    let store = InMemoryStore::new();
    let now = Utc::now();
    let upstream = Job::builder().idempotency_key("upstream").scheduled_at(now).build();
    let downstream = Job::builder().idempotency_key("downstream").scheduled_at(now).build();
    store.insert_job(upstream.clone()).await.unwrap();
    store.insert_job(downstream.clone()).await.unwrap();
    store.insert_dependency(DependencyEdge::new(downstream.id, upstream.id)).await.unwrap();

    let claimed = store.claim_ready_jobs(10, now).await.unwrap();
    assert_eq!(claimed.len(), 1);
    assert_eq!(claimed[0].id, upstream.id);
}

#[tokio::test]
async fn insert_dependency_rejects_cycles() {
    let store = InMemoryStore::new();
    let a = Job::builder().idempotency_key("a").build();
    let b = Job::builder().idempotency_key("b").build();
    store.insert_job(a.clone()).await.unwrap();
    store.insert_job(b.clone()).await.unwrap();

    store.insert_dependency(DependencyEdge::new(b.id, a.id)).await.unwrap();
    let err = store.insert_dependency(DependencyEdge::new(a.id, b.id)).await.unwrap_err();
    assert!(matches!(err, StoreError::CycleDetected));
}

#[tokio::test]
async fn insert_dependency_rejects_self_loop() {
    let store = InMemoryStore::new();
    let a = Job::builder().idempotency_key("a").build();
    store.insert_job(a.clone()).await.unwrap();
    let err = store.insert_dependency(DependencyEdge::new(a.id, a.id)).await.unwrap_err();
    assert!(matches!(err, StoreError::CycleDetected));
}

#[tokio::test]
async fn update_job_status_conflicts_on_stale_expected() {
    let store = InMemoryStore::new();
    let now = Utc::now();
    let job = Job::new(echo_config(), now);
    store.insert_job(job.clone()).await.unwrap();

    let err = store
        .update_job_status(job.id, JobStatus::Running, JobStatusUpdate::to(JobStatus::Success), now)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict { expected: JobStatus::Running, actual: JobStatus::Pending }));
}

#[tokio::test]
async fn update_job_status_applies_error_fields_on_failure() {
    let store = InMemoryStore::new();
    let now = Utc::now();
    let job = Job::builder().status(JobStatus::Running).build();
    store.insert_job(job.clone()).await.unwrap();

    let update = JobStatusUpdate {
        next: Some(JobStatus::Failed),
        error_message: Some(Some("boom".to_string())),
        ..Default::default()
    };
    let updated = store.update_job_status(job.id, JobStatus::Running, update, now).await.unwrap();
    assert_eq!(updated.status, JobStatus::Failed);
    assert_eq!(updated.error_message.as_deref(), Some("boom"));
}

#[tokio::test]
async fn reassign_jobs_of_worker_requeues_when_retries_remain() {
    let store = InMemoryStore::new();
    let now = Utc::now();
    let worker = Worker::register("host-a", 1, "0.1.0", 4, now);
    let job = Job::builder()
        .status(JobStatus::Running)
        .worker_id(Some(worker.id))
        .attempt(0)
        .max_attempts(3)
        .build();
    store.insert_job(job.clone()).await.unwrap();

    let report = store.reassign_jobs_of_worker(worker.id, now).await.unwrap();
    assert_eq!(report.requeued, vec![job.id]);
    assert!(report.dead_lettered.is_empty());

    let reloaded = store.get_job(job.id).await.unwrap();
    assert_eq!(reloaded.status, JobStatus::Pending);
    assert_eq!(reloaded.attempt, 1);
    assert!(reloaded.worker_id.is_none());
}

#[tokio::test]
async fn reassign_jobs_of_worker_dead_letters_when_retries_exhausted() {
    let store = InMemoryStore::new();
    let now = Utc::now();
    let worker = Worker::register("host-a", 1, "0.1.0", 4, now);
    let job = Job::builder()
        .status(JobStatus::Scheduled)
        .worker_id(Some(worker.id))
        .attempt(2)
        .max_attempts(3)
        .build();
    store.insert_job(job.clone()).await.unwrap();

    let report = store.reassign_jobs_of_worker(worker.id, now).await.unwrap();
    assert_eq!(report.dead_lettered, vec![job.id]);

    let reloaded = store.get_job(job.id).await.unwrap();
    assert_eq!(reloaded.status, JobStatus::Dead);
    assert_eq!(reloaded.attempt, reloaded.max_attempts);
}

#[tokio::test]
async fn sweep_orphan_scheduled_reverts_stale_claims() {
    let store = InMemoryStore::new();
    let now = Utc::now();
    let mut job = Job::builder().status(JobStatus::Scheduled).build();
    job.updated_at = now - chrono::Duration::minutes(10);
    store.insert_job(job.clone()).await.unwrap();

    let orphans = store.sweep_orphan_scheduled(Duration::from_secs(60), now).await.unwrap();
    assert_eq!(orphans, vec![job.id]);
    let reloaded = store.get_job(job.id).await.unwrap();
    assert_eq!(reloaded.status, JobStatus::Pending);
}

#[tokio::test]
async fn cancel_job_rejects_terminal_rows() {
    let store = InMemoryStore::new();
    let job = Job::builder().status(JobStatus::Success).build();
    store.insert_job(job.clone()).await.unwrap();
    let err = store.cancel_job(job.id, Utc::now()).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict { .. }));
}

#[tokio::test]
async fn remove_stopped_workers_respects_cleanup_window() {
    let store = InMemoryStore::new();
    let now = Utc::now();
    let worker = Worker::register("host-a", 1, "0.1.0", 4, now);
    store.upsert_worker(worker.clone()).await.unwrap();
    store.deregister_worker(worker.id, now - chrono::Duration::hours(2)).await.unwrap();

    let removed = store.remove_stopped_workers(now, Duration::from_secs(3600)).await.unwrap();
    assert_eq!(removed, vec![worker.id]);
    assert!(store.list_active_workers().await.unwrap().is_empty());
}

#[tokio::test]
async fn mark_worker_stale_updates_status() {
    let store = InMemoryStore::new();
    let now = Utc::now();
    let worker = Worker::register("host-a", 1, "0.1.0", 4, now);
    store.upsert_worker(worker.clone()).await.unwrap();
    store.mark_worker_stale(worker.id).await.unwrap();

    let stale = store.list_stale_workers(now, Duration::from_secs(0)).await.unwrap();
    assert!(stale.is_empty(), "a STALE worker is no longer reported by list_stale_workers, which only scans ACTIVE ones");

    let active = store.list_active_workers().await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].status, WorkerStatus::Stale);
}
