// SPDX-License-Identifier: MIT

use super::*;
use orc_broker::InMemoryBroker;
use orc_core::{FakeClock, Job, JobStatus, Worker};
use orc_storage::InMemoryStore;
use std::time::Duration;

#[tokio::test]
async fn run_once_reassigns_jobs_of_stale_workers() {
    let clock = FakeClock::new();
    let start = chrono::Utc::now();
    clock.set(start);

    let store = Arc::new(InMemoryStore::new());
    let broker = Arc::new(InMemoryBroker::new());

    let worker = Worker::register("host-a", 1, "0.1.0", 4, start);
    store.upsert_worker(worker.clone()).await.unwrap();

    let job = Job::builder().status(JobStatus::Running).worker_id(Some(worker.id)).max_attempts(3).attempt(0).build();
    store.insert_job(job.clone()).await.unwrap();

    clock.advance(Duration::from_secs(120));
    let config = HeartbeatConfig {
        tick: Duration::from_secs(30),
        stale_threshold: Duration::from_secs(90),
        orphan_grace: Duration::from_secs(60),
        worker_cleanup_window: Duration::from_secs(3600),
    };
    let monitor = HeartbeatMonitor::new(store.clone(), broker.clone(), clock.clone(), config);
    let report = monitor.run_once().await.unwrap();

    assert_eq!(report.marked_stale, 1);
    assert_eq!(report.requeued, 1);

    let reloaded = store.get_job(job.id).await.unwrap();
    assert_eq!(reloaded.status, JobStatus::Pending);
}

#[tokio::test]
async fn run_once_sweeps_orphan_scheduled_jobs() {
    let clock = FakeClock::new();
    let start = chrono::Utc::now();
    clock.set(start);

    let store = Arc::new(InMemoryStore::new());
    let broker = Arc::new(InMemoryBroker::new());

    let mut job = Job::builder().status(JobStatus::Scheduled).build();
    job.updated_at = start;
    store.insert_job(job.clone()).await.unwrap();

    clock.advance(Duration::from_secs(120));
    let config = HeartbeatConfig {
        tick: Duration::from_secs(30),
        stale_threshold: Duration::from_secs(90),
        orphan_grace: Duration::from_secs(60),
        worker_cleanup_window: Duration::from_secs(3600),
    };
    let monitor = HeartbeatMonitor::new(store.clone(), broker.clone(), clock.clone(), config);
    let report = monitor.run_once().await.unwrap();

    assert_eq!(report.orphans_swept, 1);
    let reloaded = store.get_job(job.id).await.unwrap();
    assert_eq!(reloaded.status, JobStatus::Pending);
}
