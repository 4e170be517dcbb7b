// SPDX-License-Identifier: MIT

use super::*;
use orc_broker::InMemoryBroker;
use orc_core::dto::CreateWorkflowRequest;
use orc_core::{FakeClock, JobStatus};
use orc_daemon::listener::Listener;
use orc_storage::InMemoryStore;
use std::sync::Arc;
use tokio::net::UnixListener;
use tokio_util::sync::CancellationToken;

async fn spawn_server() -> (OrcClient, CancellationToken, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let socket_path = dir.path().join("orcd.sock");
    let unix = UnixListener::bind(&socket_path).unwrap();

    let store = Arc::new(InMemoryStore::new());
    let broker = Arc::new(InMemoryBroker::new());
    let clock = FakeClock::new();
    clock.set(chrono::Utc::now());

    let listener = Listener::new(unix, store, broker, clock);
    let shutdown = CancellationToken::new();
    let run_token = shutdown.clone();
    tokio::spawn(async move { listener.run(run_token).await });

    (OrcClient::new(socket_path), shutdown, dir)
}

fn create_request(idempotency_key: &str) -> CreateJobRequest {
    CreateJobRequest {
        job_type: "echo".to_string(),
        payload: serde_json::json!({"m": "hi"}),
        idempotency_key: idempotency_key.to_string(),
        priority: 5,
        max_attempts: 3,
        timeout_secs: 60,
        retry_policy: orc_core::RetryPolicyKind::Exponential,
        base_delay_secs: None,
        scheduled_at: None,
        workflow_id: None,
    }
}

#[tokio::test]
async fn create_and_get_job_round_trip() {
    let (client, shutdown, _dir) = spawn_server().await;

    let job = client.create_job(create_request("k1")).await.unwrap();
    assert_eq!(job.status, JobStatus::Pending);

    let fetched = client.get_job(job.id).await.unwrap();
    assert_eq!(fetched.id, job.id);

    shutdown.cancel();
}

#[tokio::test]
async fn cancel_job_transitions_to_canceled() {
    let (client, shutdown, _dir) = spawn_server().await;
    let job = client.create_job(create_request("k2")).await.unwrap();

    let canceled = client.cancel_job(job.id).await.unwrap();
    assert_eq!(canceled.status, JobStatus::Canceled);

    shutdown.cancel();
}

#[tokio::test]
async fn get_job_surfaces_not_found_as_a_client_error() {
    let (client, shutdown, _dir) = spawn_server().await;

    let err = client.get_job(orc_core::JobId::new()).await.unwrap_err();
    assert!(matches!(err, ClientError::Remote { kind, .. } if kind == "not_found"));

    shutdown.cancel();
}

#[tokio::test]
async fn workflow_create_attach_and_status_round_trip() {
    let (client, shutdown, _dir) = spawn_server().await;

    let workflow = client
        .create_workflow(CreateWorkflowRequest { name: "nightly-etl".to_string(), description: "".to_string(), config: serde_json::Value::Null })
        .await
        .unwrap();

    let job = client.create_job(create_request("k3")).await.unwrap();
    client.attach_job_to_workflow(workflow.id, job.id).await.unwrap();

    let status = client.get_workflow_status(workflow.id).await.unwrap();
    assert_eq!(status.counts.pending, 1);

    shutdown.cancel();
}

#[tokio::test]
async fn queue_stats_and_purge_round_trip() {
    let (client, shutdown, _dir) = spawn_server().await;
    client.create_job(create_request("k4")).await.unwrap();

    client.purge_queue().await.unwrap();
    let stats = client.get_queue_stats().await.unwrap();
    assert_eq!(stats.ready_len, 0);

    shutdown.cancel();
}
