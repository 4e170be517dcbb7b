// SPDX-License-Identifier: MIT

use super::*;
use orc_broker::InMemoryBroker;
use orc_core::{FakeClock, Job, JobConfig, JobStatus, RetryPolicyKind, WorkerId};
use orc_storage::InMemoryStore;
use std::time::Duration as StdDuration;

async fn scheduled_job(store: &InMemoryStore, clock: &FakeClock, config: JobConfig) -> Job {
    let job = Job::new(config, clock.now());
    store.insert_job(job.clone()).await.unwrap();
    store
        .update_job_status(
            job.id,
            JobStatus::Pending,
            JobStatusUpdate {
                next: Some(JobStatus::Scheduled),
                worker_id: Some(Some(WorkerId::in_broker_sentinel())),
                ..Default::default()
            },
            clock.now(),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn claim_job_cas_fails_once_job_is_no_longer_scheduled() {
    let clock = FakeClock::new();
    clock.set(chrono::Utc::now());
    let store = InMemoryStore::new();
    let config = JobConfig::builder("echo", "k1").build(clock.now());
    let job = scheduled_job(&store, &clock, config).await;

    let worker_id = WorkerId::new();
    claim_job(&store, &clock, job.id, worker_id).await.unwrap();
    let second = claim_job(&store, &clock, job.id, WorkerId::new()).await;
    assert!(second.is_err());
}

#[tokio::test]
async fn report_success_transitions_running_to_success() {
    let clock = FakeClock::new();
    clock.set(chrono::Utc::now());
    let store = InMemoryStore::new();
    let config = JobConfig::builder("echo", "k2").build(clock.now());
    let job = scheduled_job(&store, &clock, config).await;
    claim_job(&store, &clock, job.id, WorkerId::new()).await.unwrap();

    let updated = report_success(&store, &clock, job.id, serde_json::json!({"ok": true})).await.unwrap();
    assert_eq!(updated.status, JobStatus::Success);
    assert_eq!(updated.result, Some(serde_json::json!({"ok": true})));
    assert!(updated.completed_at.is_some());
}

#[tokio::test]
async fn report_failure_requeues_to_pending_when_attempts_remain() {
    let clock = FakeClock::new();
    clock.set(chrono::Utc::now());
    let store = InMemoryStore::new();
    let broker = InMemoryBroker::new();
    let config = JobConfig::builder("always_fail", "k3")
        .max_attempts(3)
        .retry_policy(RetryPolicyKind::Fixed)
        .base_delay(StdDuration::from_secs(1))
        .build(clock.now());
    let job = scheduled_job(&store, &clock, config).await;
    claim_job(&store, &clock, job.id, WorkerId::new()).await.unwrap();

    let updated = report_failure(&store, &broker, &clock, job.id, "boom".to_string()).await.unwrap();
    assert_eq!(updated.status, JobStatus::Pending);
    assert_eq!(updated.attempt, 1);
    assert!(updated.scheduled_at > clock.now());
    assert_eq!(broker.list_dlq().await.unwrap().len(), 0);
}

#[tokio::test]
async fn report_failure_dead_letters_once_attempts_are_exhausted() {
    let clock = FakeClock::new();
    clock.set(chrono::Utc::now());
    let store = InMemoryStore::new();
    let broker = InMemoryBroker::new();
    let config = JobConfig::builder("always_fail", "k4")
        .max_attempts(1)
        .retry_policy(RetryPolicyKind::Fixed)
        .build(clock.now());
    let job = scheduled_job(&store, &clock, config).await;
    claim_job(&store, &clock, job.id, WorkerId::new()).await.unwrap();

    let updated = report_failure(&store, &broker, &clock, job.id, "boom".to_string()).await.unwrap();
    assert_eq!(updated.status, JobStatus::Dead);
    assert_eq!(updated.attempt, updated.max_attempts);
    let dlq = broker.list_dlq().await.unwrap();
    assert_eq!(dlq.len(), 1);
    assert_eq!(dlq[0].job_id, job.id);
}

#[tokio::test]
async fn report_unknown_type_fails_without_consuming_an_attempt() {
    let clock = FakeClock::new();
    clock.set(chrono::Utc::now());
    let store = InMemoryStore::new();
    let config = JobConfig::builder("mystery", "k5").build(clock.now());
    let job = scheduled_job(&store, &clock, config).await;
    claim_job(&store, &clock, job.id, WorkerId::new()).await.unwrap();

    let updated = report_unknown_type(&store, &clock, job.id).await.unwrap();
    assert_eq!(updated.status, JobStatus::Failed);
    assert_eq!(updated.error_message.as_deref(), Some("UNKNOWN_TYPE"));
    assert_eq!(updated.attempt, 0);
}
