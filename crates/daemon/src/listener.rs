// SPDX-License-Identifier: MIT

//! Accepts connections on `orcd`'s Unix domain socket and dispatches each
//! [`Request`] frame to the [`Orchestrator`] (submitter/operator surface,
//! `spec.md` §6) or straight to the Store/Broker pair (the worker-facing
//! lease/claim/report surface, `spec.md` §4.8).

use crate::protocol::{read_frame, write_frame, IpcErrorPayload, Request, Response};
use orc_broker::QueueBroker;
use orc_core::Clock;
use orc_engine::{outcomes, Orchestrator};
use orc_storage::DurableStore;
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::net::{UnixListener, UnixStream};
use tokio_util::sync::CancellationToken;

pub struct Listener<S, B, C> {
    unix: UnixListener,
    store: Arc<S>,
    broker: Arc<B>,
    clock: C,
}

impl<S, B, C> Listener<S, B, C>
where
    S: DurableStore + 'static,
    B: QueueBroker + 'static,
    C: Clock + Clone + Send + Sync + 'static,
{
    pub fn new(unix: UnixListener, store: Arc<S>, broker: Arc<B>, clock: C) -> Self {
        Self { unix, store, broker, clock }
    }

    /// Accept connections until `shutdown` is cancelled. Each connection is
    /// handled on its own task; a misbehaving client can't stall others.
    pub async fn run(self, shutdown: CancellationToken) {
        let orchestrator = Arc::new(Orchestrator::new(self.store.clone(), self.broker.clone(), self.clock.clone()));
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("ipc listener stopping");
                    return;
                }
                accepted = self.unix.accept() => {
                    match accepted {
                        Ok((stream, _addr)) => {
                            let store = self.store.clone();
                            let broker = self.broker.clone();
                            let clock = self.clock.clone();
                            let orchestrator = orchestrator.clone();
                            tokio::spawn(async move {
                                if let Err(err) = handle_connection(stream, orchestrator, store, broker, clock).await {
                                    tracing::warn!(error = %err, "ipc connection ended with an error");
                                }
                            });
                        }
                        Err(err) => tracing::warn!(error = %err, "ipc accept failed"),
                    }
                }
            }
        }
    }
}

async fn handle_connection<S, B, C>(
    stream: UnixStream,
    orchestrator: Arc<Orchestrator<S, B, C>>,
    store: Arc<S>,
    broker: Arc<B>,
    clock: C,
) -> Result<(), crate::protocol::ProtocolError>
where
    S: DurableStore,
    B: QueueBroker,
    C: Clock,
{
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    loop {
        let Some(request) = read_frame::<Request, _>(&mut reader).await? else {
            return Ok(());
        };
        let response = dispatch(&orchestrator, &store, &broker, &clock, request).await;
        write_frame(&mut write_half, &response).await?;
    }
}

async fn dispatch<S, B, C>(
    orchestrator: &Orchestrator<S, B, C>,
    store: &S,
    broker: &B,
    clock: &C,
    request: Request,
) -> Response
where
    S: DurableStore,
    B: QueueBroker,
    C: Clock,
{
    match request {
        Request::CreateJob(req) => match orchestrator.create_job(req).await {
            Ok(job) => Response::Job(Box::new(job)),
            Err(err) => err.into(),
        },
        Request::GetJob { id } => match orchestrator.get_job(id).await {
            Ok(job) => Response::Job(Box::new(job)),
            Err(err) => err.into(),
        },
        Request::CancelJob { id } => match orchestrator.cancel_job(id).await {
            Ok(job) => Response::Job(Box::new(job)),
            Err(err) => err.into(),
        },
        Request::CreateWorkflow(req) => match orchestrator.create_workflow(req).await {
            Ok(workflow) => Response::Workflow(Box::new(workflow)),
            Err(err) => err.into(),
        },
        Request::AttachJobToWorkflow(req) => match orchestrator.attach_job_to_workflow(req).await {
            Ok(()) => Response::Ok,
            Err(err) => err.into(),
        },
        Request::GetWorkflowStatus { id } => match orchestrator.get_workflow_status(id).await {
            Ok(status) => Response::WorkflowStatus(status),
            Err(err) => err.into(),
        },
        Request::RegisterWorker(req) => match orchestrator.register_worker(req).await {
            Ok(worker) => Response::Worker(Box::new(worker)),
            Err(err) => err.into(),
        },
        Request::SendHeartbeat(req) => match orchestrator.send_heartbeat(req).await {
            Ok(worker) => Response::Worker(Box::new(worker)),
            Err(err) => err.into(),
        },
        Request::DeregisterWorker { worker_id } => match orchestrator.deregister_worker(worker_id).await {
            Ok(()) => Response::Ok,
            Err(err) => err.into(),
        },
        Request::ListActiveWorkers => match orchestrator.list_active_workers().await {
            Ok(workers) => Response::Workers(workers),
            Err(err) => err.into(),
        },
        Request::GetQueueStats => match orchestrator.get_queue_stats().await {
            Ok(stats) => Response::QueueStats(stats),
            Err(err) => err.into(),
        },
        Request::PurgeQueue => match orchestrator.purge_queue().await {
            Ok(()) => Response::Ok,
            Err(err) => err.into(),
        },
        Request::ListDeadLetterJobs => match store.list_dead_letter_jobs().await {
            Ok(jobs) => Response::DeadLetterJobs(jobs),
            Err(err) => orc_core::OrchestratorError::from(err).into(),
        },
        Request::LeaseJob { timeout_ms } => match broker.lease(crate::protocol::millis_to_duration(timeout_ms)).await {
            Ok(job_id) => Response::LeasedJob(job_id),
            Err(err) => orc_core::OrchestratorError::Unavailable(err.to_string()).into(),
        },
        Request::AckJob { job_id } => match broker.ack(job_id).await {
            Ok(()) => Response::Ok,
            Err(err) => orc_core::OrchestratorError::Unavailable(err.to_string()).into(),
        },
        Request::ClaimJob { job_id, worker_id } => match outcomes::claim_job(store, clock, job_id, worker_id).await {
            Ok(job) => Response::Job(Box::new(job)),
            Err(err) => orc_core::OrchestratorError::from(err).into(),
        },
        Request::ReportSuccess { job_id, result } => match outcomes::report_success(store, clock, job_id, result).await {
            Ok(job) => Response::Job(Box::new(job)),
            Err(err) => orc_core::OrchestratorError::from(err).into(),
        },
        Request::ReportFailure { job_id, reason } => {
            match outcomes::report_failure(store, broker, clock, job_id, reason).await {
                Ok(job) => Response::Job(Box::new(job)),
                Err(err) => orc_core::OrchestratorError::from(err).into(),
            }
        }
        Request::ReportUnknownType { job_id } => match outcomes::report_unknown_type(store, clock, job_id).await {
            Ok(job) => Response::Job(Box::new(job)),
            Err(err) => orc_core::OrchestratorError::from(err).into(),
        },
    }
}

impl From<orc_core::OrchestratorError> for Response {
    fn from(err: orc_core::OrchestratorError) -> Self {
        Response::Error(IpcErrorPayload::from(err))
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
