// SPDX-License-Identifier: MIT

//! The IPC wire protocol `orcd` speaks over its Unix domain socket.
//!
//! Everything outside THE CORE — an HTTP surface, a CLI, remote workers —
//! is out of scope for `spec.md`, but something has to let `orc-cli` submit
//! jobs and `orc-worker` lease them from a control-plane process that isn't
//! in the same address space. This is that something: newline-delimited
//! JSON [`Request`]/[`Response`] frames, read with [`read_frame`] and
//! written with [`write_frame`] by both [`crate::listener`] and
//! [`crate::client`].
//!
//! Submitter- and operator-facing requests mirror `spec.md` §6 one for one.
//! The `Lease`/`Claim`/`Report*` requests are coarser than the Durable
//! Store's own contract (`spec.md` §4.1): a remote worker has no business
//! driving row-level CAS directly, so it reports outcomes and the daemon
//! applies `spec.md` §4.6's retry policy on its behalf.

use orc_core::dto::{
    AttachJobToWorkflowRequest, CreateJobRequest, CreateWorkflowRequest, QueueStats, RegisterWorkerRequest,
    SendHeartbeatRequest, WorkflowStatusResponse,
};
use orc_core::{Job, JobId, OrchestratorError, Worker, WorkerId, Workflow, WorkflowId};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

pub const DEFAULT_SOCKET_NAME: &str = "orcd.sock";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Request {
    CreateJob(CreateJobRequest),
    GetJob { id: JobId },
    CancelJob { id: JobId },
    CreateWorkflow(CreateWorkflowRequest),
    AttachJobToWorkflow(AttachJobToWorkflowRequest),
    GetWorkflowStatus { id: WorkflowId },
    RegisterWorker(RegisterWorkerRequest),
    SendHeartbeat(SendHeartbeatRequest),
    DeregisterWorker { worker_id: WorkerId },
    ListActiveWorkers,
    GetQueueStats,
    PurgeQueue,
    ListDeadLetterJobs,

    /// Pop the next ready job id under priority order (`spec.md` §4.2),
    /// blocking up to `timeout_ms` if none is ready.
    LeaseJob { timeout_ms: u64 },
    /// Confirm a leased entry was handled, success or failure alike.
    AckJob { job_id: JobId },
    /// CAS SCHEDULED -> RUNNING for `worker_id` (`spec.md` §4.8 step i).
    ClaimJob { job_id: JobId, worker_id: WorkerId },
    /// RUNNING -> SUCCESS (`spec.md` §4.8 step iv).
    ReportSuccess { job_id: JobId, result: serde_json::Value },
    /// RUNNING -> FAILED, then `spec.md` §4.6's retry policy (step v).
    ReportFailure { job_id: JobId, reason: String },
    /// RUNNING -> FAILED(UNKNOWN_TYPE), no retry (`spec.md` §4.8 step ii).
    ReportUnknownType { job_id: JobId },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Response {
    Job(Box<Job>),
    Workflow(Box<Workflow>),
    Worker(Box<Worker>),
    WorkflowStatus(WorkflowStatusResponse),
    Workers(Vec<Worker>),
    DeadLetterJobs(Vec<Job>),
    QueueStats(QueueStats),
    LeasedJob(Option<JobId>),
    Ok,
    Error(IpcErrorPayload),
}

/// [`OrchestratorError`] flattened to cross the wire; reconstructed by
/// [`crate::client::ClientError`] on the far side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpcErrorPayload {
    pub kind: String,
    pub message: String,
}

impl From<OrchestratorError> for IpcErrorPayload {
    fn from(err: OrchestratorError) -> Self {
        let kind = match &err {
            OrchestratorError::NotFound => "not_found",
            OrchestratorError::DuplicateIdempotency => "duplicate_idempotency",
            OrchestratorError::DuplicateName => "duplicate_name",
            OrchestratorError::InvalidTransition { .. } => "invalid_transition",
            OrchestratorError::Conflict { .. } => "conflict",
            OrchestratorError::Validation(_) => "validation",
            OrchestratorError::CycleDetected => "cycle_detected",
            OrchestratorError::Unavailable(_) => "unavailable",
        };
        Self { kind: kind.to_string(), message: err.to_string() }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("protocol error: {0}")]
pub struct ProtocolError(pub String);

impl From<serde_json::Error> for ProtocolError {
    fn from(e: serde_json::Error) -> Self {
        Self(e.to_string())
    }
}

impl From<std::io::Error> for ProtocolError {
    fn from(e: std::io::Error) -> Self {
        Self(e.to_string())
    }
}

/// Read one newline-delimited JSON frame. Returns `Ok(None)` on a clean EOF
/// (peer closed the connection between requests).
pub async fn read_frame<T, R>(reader: &mut BufReader<R>) -> Result<Option<T>, ProtocolError>
where
    T: for<'de> Deserialize<'de>,
    R: tokio::io::AsyncRead + Unpin,
{
    let mut line = String::new();
    let read = reader.read_line(&mut line).await?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(line.trim_end())?))
}

pub async fn write_frame<T, W>(writer: &mut W, value: &T) -> Result<(), ProtocolError>
where
    T: Serialize,
    W: tokio::io::AsyncWrite + Unpin,
{
    let mut line = serde_json::to_string(value)?;
    line.push('\n');
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

pub fn millis_to_duration(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
