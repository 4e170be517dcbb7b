// SPDX-License-Identifier: MIT

//! The `spec.md` §4.8 Worker Runtime, run as its own process: the same
//! heartbeat emitter / lease loop / execution-activity shape as
//! [`orc_engine::WorkerRuntime`], but every Store/Broker interaction crosses
//! `orcd`'s IPC socket instead of calling a local trait object directly.
//! Execution steps (i), (iv)-(v) in `spec.md` §4.8 — the retry-policy
//! bookkeeping — are applied daemon-side by `orcd`'s listener
//! (`orc_engine::outcomes`); this runtime only reports outcomes.

use crate::config::WorkerProcessConfig;
use crate::error::WorkerError;
use orc_core::dto::{RegisterWorkerRequest, SendHeartbeatRequest};
use orc_core::{JobId, WorkerId, WorkerTelemetry};
use orc_daemon::client::reject_error;
use orc_daemon::{IpcClient, Request, Response};
use orc_engine::HandlerRegistry;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

pub struct RemoteWorkerRuntime {
    client: IpcClient,
    config: WorkerProcessConfig,
    handlers: HandlerRegistry,
    worker_id: WorkerId,
}

impl RemoteWorkerRuntime {
    pub async fn register(client: IpcClient, config: WorkerProcessConfig, handlers: HandlerRegistry) -> Result<Self, WorkerError> {
        let request = Request::RegisterWorker(RegisterWorkerRequest {
            hostname: config.runtime.hostname.clone(),
            process_id: std::process::id(),
            version: config.runtime.version.clone(),
            max_concurrent_jobs: config.runtime.max_concurrent_jobs,
        });
        let response = reject_error(client.call(&request).await?)?;
        let Response::Worker(worker) = response else { return Err(WorkerError::UnexpectedResponse) };
        Ok(Self { client, config, handlers, worker_id: worker.id })
    }

    pub fn worker_id(&self) -> WorkerId {
        self.worker_id
    }

    /// Run until `shutdown` is cancelled, then drain in-flight executions up
    /// to `shutdown_deadline` (`spec.md` §4.8 graceful shutdown).
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        let permits = Arc::new(Semaphore::new(self.config.runtime.max_concurrent_jobs as usize));
        let heartbeat = tokio::spawn(self.clone().run_heartbeat_emitter(shutdown.clone()));
        let lease_loop = tokio::spawn(self.clone().run_lease_loop(shutdown.clone(), permits.clone()));

        shutdown.cancelled().await;
        tracing::info!(worker_id = %self.worker_id, "worker process shutting down, draining in-flight executions");
        let _ = tokio::time::timeout(
            self.config.runtime.shutdown_deadline,
            permits.acquire_many(self.config.runtime.max_concurrent_jobs),
        )
        .await;

        heartbeat.abort();
        lease_loop.abort();
        let _ = self.client.call(&Request::DeregisterWorker { worker_id: self.worker_id }).await;
    }

    async fn run_heartbeat_emitter(self: Arc<Self>, shutdown: CancellationToken) {
        let mut interval = tokio::time::interval(self.config.runtime.heartbeat_interval);
        let mut consecutive_failures = 0u32;
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return,
                _ = interval.tick() => {
                    let request = Request::SendHeartbeat(SendHeartbeatRequest {
                        worker_id: self.worker_id,
                        telemetry: WorkerTelemetry::default(),
                    });
                    match self.client.call(&request).await {
                        Ok(_) => consecutive_failures = 0,
                        Err(err) => {
                            consecutive_failures += 1;
                            tracing::warn!(error = %err, consecutive_failures, "heartbeat send failed");
                            if consecutive_failures >= self.config.runtime.max_heartbeat_failures {
                                tracing::error!(worker_id = %self.worker_id, "max heartbeat failures reached, initiating graceful shutdown");
                                shutdown.cancel();
                                return;
                            }
                        }
                    }
                }
            }
        }
    }

    async fn run_lease_loop(self: Arc<Self>, shutdown: CancellationToken, permits: Arc<Semaphore>) {
        loop {
            if shutdown.is_cancelled() {
                return;
            }
            let timeout_ms = self.config.runtime.lease_timeout.as_millis() as u64;
            let leased = tokio::select! {
                _ = shutdown.cancelled() => return,
                leased = self.client.call(&Request::LeaseJob { timeout_ms }) => leased,
            };
            let job_id = match leased {
                Ok(Response::LeasedJob(Some(id))) => id,
                Ok(Response::LeasedJob(None)) => continue,
                Ok(_) => continue,
                Err(err) => {
                    tracing::warn!(error = %err, "lease call failed");
                    continue;
                }
            };

            let Ok(permit) = permits.clone().acquire_owned().await else { return };
            let runtime = self.clone();
            tokio::spawn(async move {
                runtime.execute_job(job_id).await;
                drop(permit);
            });
        }
    }

    /// One execution activity (`spec.md` §4.8 execution steps (i)-(vi)).
    #[tracing::instrument(skip(self))]
    async fn execute_job(&self, job_id: JobId) {
        // (i) claim the job for this worker.
        let claim = match self.client.call(&Request::ClaimJob { job_id, worker_id: self.worker_id }).await {
            Ok(response) => reject_error(response),
            Err(err) => Err(err),
        };
        let job = match claim {
            Ok(Response::Job(job)) => *job,
            _ => {
                // Conflict (reclaimed by heartbeat monitor) or a transport
                // error: either way, abandon and ack so the broker doesn't
                // leak the entry.
                let _ = self.client.call(&Request::AckJob { job_id }).await;
                return;
            }
        };

        // (ii) look up the handler.
        let Some(handler) = self.handlers.get(&job.job_type) else {
            let _ = self.client.call(&Request::ReportUnknownType { job_id }).await;
            let _ = self.client.call(&Request::AckJob { job_id }).await;
            return;
        };

        // (iii) run with a timeout equal to the job's configured timeout.
        let outcome = tokio::time::timeout(job.timeout, handler.handle(job.payload.clone())).await;

        let report = match outcome {
            // (iv) success.
            Ok(Ok(result)) => Request::ReportSuccess { job_id, result },
            // (v) handler exception.
            Ok(Err(err)) => Request::ReportFailure { job_id, reason: err.to_string() },
            // (iii) timeout.
            Err(_) => Request::ReportFailure { job_id, reason: "TIMEOUT".to_string() },
        };
        if let Err(err) = self.client.call(&report).await {
            tracing::warn!(job_id = %job_id, error = %err, "failed to report execution outcome");
        }

        // (vi) ack the broker regardless of outcome.
        let _ = self.client.call(&Request::AckJob { job_id }).await;
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
