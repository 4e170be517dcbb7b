// SPDX-License-Identifier: MIT

use super::*;
use orc_broker::InMemoryBroker;
use orc_core::dto::{RegisterWorkerRequest, SendHeartbeatRequest};
use orc_core::{FakeClock, WorkflowStatus};
use orc_storage::InMemoryStore;
use std::sync::Arc;

fn new_orchestrator() -> Orchestrator<InMemoryStore, InMemoryBroker, FakeClock> {
    let clock = FakeClock::new();
    clock.set(chrono::Utc::now());
    Orchestrator::new(Arc::new(InMemoryStore::new()), Arc::new(InMemoryBroker::new()), clock)
}

fn job_request(idempotency_key: &str) -> CreateJobRequest {
    CreateJobRequest {
        job_type: "echo".to_string(),
        payload: serde_json::Value::Null,
        idempotency_key: idempotency_key.to_string(),
        priority: 5,
        max_attempts: 3,
        timeout_secs: 3600,
        retry_policy: orc_core::RetryPolicyKind::Exponential,
        base_delay_secs: None,
        scheduled_at: None,
        workflow_id: None,
    }
}

#[tokio::test]
async fn create_job_then_get_job_round_trips() {
    let orchestrator = new_orchestrator();
    let job = orchestrator.create_job(job_request("k1")).await.unwrap();
    let fetched = orchestrator.get_job(job.id).await.unwrap();
    assert_eq!(fetched.id, job.id);
    assert_eq!(fetched.status, orc_core::JobStatus::Pending);
}

#[tokio::test]
async fn create_job_rejects_a_duplicate_idempotency_key() {
    let orchestrator = new_orchestrator();
    orchestrator.create_job(job_request("dup")).await.unwrap();
    let err = orchestrator.create_job(job_request("dup")).await.unwrap_err();
    assert!(matches!(err, OrchestratorError::DuplicateIdempotency));
}

#[tokio::test]
async fn create_job_rejects_an_empty_job_type() {
    let orchestrator = new_orchestrator();
    let mut request = job_request("k2");
    request.job_type = "   ".to_string();
    let err = orchestrator.create_job(request).await.unwrap_err();
    assert!(matches!(err, OrchestratorError::Validation(_)));
}

#[tokio::test]
async fn create_job_rejects_priority_above_ten() {
    let orchestrator = new_orchestrator();
    let mut request = job_request("k3");
    request.priority = 11;
    let err = orchestrator.create_job(request).await.unwrap_err();
    assert!(matches!(err, OrchestratorError::Validation(_)));
}

#[tokio::test]
async fn cancel_job_moves_a_pending_job_to_canceled() {
    let orchestrator = new_orchestrator();
    let job = orchestrator.create_job(job_request("k4")).await.unwrap();
    let canceled = orchestrator.cancel_job(job.id).await.unwrap();
    assert_eq!(canceled.status, orc_core::JobStatus::Canceled);
}

#[tokio::test]
async fn create_workflow_rejects_a_duplicate_name() {
    let orchestrator = new_orchestrator();
    let request = CreateWorkflowRequest { name: "nightly-etl".to_string(), description: "".to_string(), config: serde_json::Value::Null };
    orchestrator.create_workflow(request.clone()).await.unwrap();
    let err = orchestrator.create_workflow(request).await.unwrap_err();
    assert!(matches!(err, OrchestratorError::DuplicateName));
}

#[tokio::test]
async fn attach_job_to_workflow_then_status_reflects_the_job() {
    let orchestrator = new_orchestrator();
    let workflow = orchestrator
        .create_workflow(CreateWorkflowRequest { name: "etl".to_string(), description: "".to_string(), config: serde_json::Value::Null })
        .await
        .unwrap();
    let job = orchestrator.create_job(job_request("k5")).await.unwrap();

    orchestrator
        .attach_job_to_workflow(AttachJobToWorkflowRequest { workflow_id: workflow.id, job_id: job.id })
        .await
        .unwrap();

    let status = orchestrator.get_workflow_status(workflow.id).await.unwrap();
    assert_eq!(status.status, WorkflowStatus::Pending);
    assert_eq!(status.counts.pending, 1);
}

#[tokio::test]
async fn attach_job_to_workflow_errors_not_found_for_an_unknown_workflow() {
    let orchestrator = new_orchestrator();
    let job = orchestrator.create_job(job_request("k6")).await.unwrap();
    let err = orchestrator
        .attach_job_to_workflow(AttachJobToWorkflowRequest { workflow_id: WorkflowId::new(), job_id: job.id })
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::NotFound));
}

#[tokio::test]
async fn register_worker_then_list_active_workers_includes_it() {
    let orchestrator = new_orchestrator();
    let worker = orchestrator
        .register_worker(RegisterWorkerRequest { hostname: "host-a".to_string(), process_id: 1, version: "0.1.0".to_string(), max_concurrent_jobs: 4 })
        .await
        .unwrap();

    let active = orchestrator.list_active_workers().await.unwrap();
    assert!(active.iter().any(|w| w.id == worker.id));
}

#[tokio::test]
async fn send_heartbeat_updates_the_registered_worker() {
    let orchestrator = new_orchestrator();
    let worker = orchestrator
        .register_worker(RegisterWorkerRequest { hostname: "host-a".to_string(), process_id: 1, version: "0.1.0".to_string(), max_concurrent_jobs: 4 })
        .await
        .unwrap();

    let updated = orchestrator
        .send_heartbeat(SendHeartbeatRequest { worker_id: worker.id, telemetry: Default::default() })
        .await
        .unwrap();
    assert_eq!(updated.id, worker.id);
}

#[tokio::test]
async fn deregister_worker_removes_it_from_the_active_list() {
    let orchestrator = new_orchestrator();
    let worker = orchestrator
        .register_worker(RegisterWorkerRequest { hostname: "host-a".to_string(), process_id: 1, version: "0.1.0".to_string(), max_concurrent_jobs: 4 })
        .await
        .unwrap();

    orchestrator.deregister_worker(worker.id).await.unwrap();
    let active = orchestrator.list_active_workers().await.unwrap();
    assert!(active.iter().all(|w| w.id != worker.id));
}

#[tokio::test]
async fn queue_stats_and_purge_reflect_the_broker() {
    let orchestrator = new_orchestrator();
    orchestrator.create_job(job_request("k7")).await.unwrap();

    orchestrator.purge_queue().await.unwrap();
    let stats = orchestrator.get_queue_stats().await.unwrap();
    assert_eq!(stats.ready_len, 0);
}
