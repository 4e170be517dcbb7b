// SPDX-License-Identifier: MIT

//! Submission-interface data contracts (`spec.md` §6).
//!
//! These are the typed request/response shapes the (out-of-scope) HTTP
//! layer would bind to; kept here as a named, versioned surface the way the
//! teacher's `oj-wire` crate gives the CLI and daemon a shared contract,
//! even though this core has no network wire format of its own.

use crate::job::{JobId, WorkflowId};
use crate::retry::RetryPolicyKind;
use crate::worker::{WorkerId, WorkerTelemetry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn default_priority() -> u8 {
    5
}
fn default_max_attempts() -> u32 {
    3
}
fn default_timeout_secs() -> u64 {
    3600
}
fn default_retry_policy() -> RetryPolicyKind {
    RetryPolicyKind::Exponential
}

/// create-job request body (`spec.md` §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateJobRequest {
    #[serde(rename = "type")]
    pub job_type: String,
    pub payload: serde_json::Value,
    pub idempotency_key: String,
    #[serde(default = "default_priority")]
    pub priority: u8,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_retry_policy")]
    pub retry_policy: RetryPolicyKind,
    pub base_delay_secs: Option<u64>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub workflow_id: Option<WorkflowId>,
}

/// create-workflow request body (`spec.md` §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWorkflowRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub config: serde_json::Value,
}

/// attach-job-to-workflow request body (`spec.md` §6).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AttachJobToWorkflowRequest {
    pub workflow_id: WorkflowId,
    pub job_id: JobId,
}

/// register-worker request body (`spec.md` §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterWorkerRequest {
    pub hostname: String,
    pub process_id: u32,
    pub version: String,
    pub max_concurrent_jobs: u32,
}

/// send-heartbeat request body (`spec.md` §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendHeartbeatRequest {
    pub worker_id: WorkerId,
    #[serde(default)]
    pub telemetry: WorkerTelemetry,
}

/// get-queue-stats response (`spec.md` §6).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QueueStats {
    pub ready_len: usize,
    pub dlq_len: usize,
}

/// get-workflow-status response (`spec.md` §4.9, §6).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WorkflowStatusResponse {
    pub status: crate::workflow::WorkflowStatus,
    pub counts: crate::workflow::WorkflowCounts,
}
