// SPDX-License-Identifier: MIT

//! Typed query/command methods layered over [`orc_daemon::IpcClient`], the
//! way the teacher's `DaemonClient` gives its CLI one method per operation
//! instead of hand-matching `Response` at every call site.

use orc_core::dto::{AttachJobToWorkflowRequest, CreateJobRequest, CreateWorkflowRequest, QueueStats, WorkflowStatusResponse};
use orc_core::{Job, JobId, Worker, WorkerId, Workflow, WorkflowId};
use orc_daemon::client::reject_error;
use orc_daemon::{ClientError, IpcClient, Request, Response};

pub struct OrcClient {
    inner: IpcClient,
}

impl OrcClient {
    pub fn new(socket_path: impl Into<std::path::PathBuf>) -> Self {
        Self { inner: IpcClient::new(socket_path) }
    }

    async fn send(&self, request: &Request) -> Result<Response, ClientError> {
        reject_error(self.inner.call(request).await?)
    }

    pub async fn create_job(&self, req: CreateJobRequest) -> Result<Job, ClientError> {
        match self.send(&Request::CreateJob(req)).await? {
            Response::Job(job) => Ok(*job),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn get_job(&self, id: JobId) -> Result<Job, ClientError> {
        match self.send(&Request::GetJob { id }).await? {
            Response::Job(job) => Ok(*job),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn cancel_job(&self, id: JobId) -> Result<Job, ClientError> {
        match self.send(&Request::CancelJob { id }).await? {
            Response::Job(job) => Ok(*job),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn create_workflow(&self, req: CreateWorkflowRequest) -> Result<Workflow, ClientError> {
        match self.send(&Request::CreateWorkflow(req)).await? {
            Response::Workflow(workflow) => Ok(*workflow),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn attach_job_to_workflow(&self, workflow_id: WorkflowId, job_id: JobId) -> Result<(), ClientError> {
        match self
            .send(&Request::AttachJobToWorkflow(AttachJobToWorkflowRequest { workflow_id, job_id }))
            .await?
        {
            Response::Ok => Ok(()),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn get_workflow_status(&self, id: WorkflowId) -> Result<WorkflowStatusResponse, ClientError> {
        match self.send(&Request::GetWorkflowStatus { id }).await? {
            Response::WorkflowStatus(status) => Ok(status),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn list_active_workers(&self) -> Result<Vec<Worker>, ClientError> {
        match self.send(&Request::ListActiveWorkers).await? {
            Response::Workers(workers) => Ok(workers),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn deregister_worker(&self, worker_id: WorkerId) -> Result<(), ClientError> {
        match self.send(&Request::DeregisterWorker { worker_id }).await? {
            Response::Ok => Ok(()),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn get_queue_stats(&self) -> Result<QueueStats, ClientError> {
        match self.send(&Request::GetQueueStats).await? {
            Response::QueueStats(stats) => Ok(stats),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn purge_queue(&self) -> Result<(), ClientError> {
        match self.send(&Request::PurgeQueue).await? {
            Response::Ok => Ok(()),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn list_dead_letter_jobs(&self) -> Result<Vec<Job>, ClientError> {
        match self.send(&Request::ListDeadLetterJobs).await? {
            Response::DeadLetterJobs(jobs) => Ok(jobs),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
