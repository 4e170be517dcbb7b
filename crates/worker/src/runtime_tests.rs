// SPDX-License-Identifier: MIT

use super::*;
use orc_broker::InMemoryBroker;
use orc_core::dto::CreateJobRequest;
use orc_core::{FakeClock, JobStatus, RetryPolicyKind};
use orc_daemon::listener::Listener;
use orc_engine::{EchoHandler, Scheduler, SchedulerConfig};
use orc_storage::InMemoryStore;
use std::time::Duration as StdDuration;
use tokio::net::UnixListener;

fn process_config(socket_path: std::path::PathBuf) -> WorkerProcessConfig {
    WorkerProcessConfig {
        socket_path,
        runtime: orc_engine::WorkerRuntimeConfig {
            hostname: "test-host".to_string(),
            version: "0.1.0".to_string(),
            max_concurrent_jobs: 2,
            heartbeat_interval: StdDuration::from_millis(30),
            max_heartbeat_failures: 3,
            lease_timeout: StdDuration::from_millis(50),
            shutdown_deadline: StdDuration::from_millis(200),
        },
    }
}

#[tokio::test]
async fn remote_worker_runs_an_echo_job_to_success() {
    let dir = tempfile::tempdir().unwrap();
    let socket_path = dir.path().join("orcd.sock");
    let unix = UnixListener::bind(&socket_path).unwrap();

    let store = std::sync::Arc::new(InMemoryStore::new());
    let broker = std::sync::Arc::new(InMemoryBroker::new());
    let clock = FakeClock::new();
    clock.set(chrono::Utc::now());

    let listener = Listener::new(unix, store.clone(), broker.clone(), clock.clone());
    let listener_shutdown = CancellationToken::new();
    let listener_task = tokio::spawn({
        let shutdown = listener_shutdown.clone();
        async move { listener.run(shutdown).await }
    });

    let client = IpcClient::new(socket_path.clone());
    let create = CreateJobRequest {
        job_type: "echo".to_string(),
        payload: serde_json::json!({"m": "hi"}),
        idempotency_key: "k1".to_string(),
        priority: 5,
        max_attempts: 3,
        timeout_secs: 60,
        retry_policy: RetryPolicyKind::Exponential,
        base_delay_secs: None,
        scheduled_at: None,
        workflow_id: None,
    };
    let response = client.call(&orc_daemon::Request::CreateJob(create)).await.unwrap();
    let orc_daemon::Response::Job(job) = orc_daemon::client::reject_error(response).unwrap() else {
        panic!("expected Job response")
    };

    // Drive the job PENDING -> SCHEDULED + broker enqueue the way the real
    // Scheduler does (`spec.md` §4.5), since this test doesn't run one.
    let scheduler = Scheduler::new(store.clone(), broker.clone(), clock.clone(), SchedulerConfig::default());
    let claimed = scheduler.run_once().await.unwrap();
    assert_eq!(claimed, 1);

    let mut handlers = HandlerRegistry::new();
    handlers.register("echo", std::sync::Arc::new(EchoHandler));
    let runtime =
        std::sync::Arc::new(RemoteWorkerRuntime::register(client, process_config(socket_path), handlers).await.unwrap());

    let worker_shutdown = CancellationToken::new();
    let run_handle = tokio::spawn({
        let runtime = runtime.clone();
        let shutdown = worker_shutdown.clone();
        async move { runtime.run(shutdown).await }
    });

    let deadline = tokio::time::Instant::now() + StdDuration::from_secs(2);
    loop {
        let reloaded = store.get_job(job.id).await.unwrap();
        if reloaded.status == JobStatus::Success {
            assert_eq!(reloaded.result, Some(serde_json::json!({"m": "hi"})));
            break;
        }
        if tokio::time::Instant::now() > deadline {
            panic!("job did not reach SUCCESS in time, status = {:?}", reloaded.status);
        }
        tokio::time::sleep(StdDuration::from_millis(20)).await;
    }

    worker_shutdown.cancel();
    let _ = tokio::time::timeout(StdDuration::from_secs(1), run_handle).await;
    listener_shutdown.cancel();
    let _ = tokio::time::timeout(StdDuration::from_secs(1), listener_task).await;
}
