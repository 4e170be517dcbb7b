// SPDX-License-Identifier: MIT

//! The Worker Runtime (`spec.md` §4.8): registers a worker, then runs three
//! cooperating activities — a heartbeat emitter, a lease loop, and one
//! execution activity per leased job.

use crate::config::WorkerRuntimeConfig;
use crate::error::EngineError;
use crate::handler::HandlerRegistry;
use crate::outcomes;
use orc_broker::QueueBroker;
use orc_core::{Clock, Worker, WorkerId, WorkerTelemetry};
use orc_storage::DurableStore;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

pub struct WorkerRuntime<S, B, C> {
    store: Arc<S>,
    broker: Arc<B>,
    clock: C,
    config: WorkerRuntimeConfig,
    handlers: HandlerRegistry,
    worker_id: WorkerId,
}

impl<S, B, C> WorkerRuntime<S, B, C>
where
    S: DurableStore + 'static,
    B: QueueBroker + 'static,
    C: Clock + Clone + Send + Sync + 'static,
{
    /// Register this process as a worker and build its runtime.
    pub async fn register(
        store: Arc<S>,
        broker: Arc<B>,
        clock: C,
        config: WorkerRuntimeConfig,
        handlers: HandlerRegistry,
    ) -> Result<Self, EngineError> {
        let now = clock.now();
        let worker = Worker::register(
            config.hostname.clone(),
            std::process::id(),
            config.version.clone(),
            config.max_concurrent_jobs,
            now,
        );
        let worker_id = worker.id;
        store.upsert_worker(worker).await?;
        Ok(Self { store, broker, clock, config, handlers, worker_id })
    }

    pub fn worker_id(&self) -> WorkerId {
        self.worker_id
    }

    /// Run until `shutdown` is cancelled, then drain in-flight executions up
    /// to `shutdown_deadline` before returning (`spec.md` §4.8 graceful
    /// shutdown: any execution still running at the deadline is abandoned —
    /// the Heartbeat Monitor reclaims it).
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        let permits = Arc::new(Semaphore::new(self.config.max_concurrent_jobs as usize));
        let heartbeat = tokio::spawn(self.clone().run_heartbeat_emitter(shutdown.clone()));
        let lease_loop = tokio::spawn(self.clone().run_lease_loop(shutdown.clone(), permits.clone()));

        shutdown.cancelled().await;
        tracing::info!(worker_id = %self.worker_id, "worker runtime shutting down, draining in-flight executions");
        let _ = tokio::time::timeout(
            self.config.shutdown_deadline,
            permits.acquire_many(self.config.max_concurrent_jobs),
        )
        .await;

        heartbeat.abort();
        lease_loop.abort();
        let _ = self.store.deregister_worker(self.worker_id, self.clock.now()).await;
    }

    async fn run_heartbeat_emitter(self: Arc<Self>, shutdown: CancellationToken) {
        let mut interval = tokio::time::interval(self.config.heartbeat_interval);
        let mut consecutive_failures = 0u32;
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return,
                _ = interval.tick() => {
                    let now = self.clock.now();
                    match self.store.touch_worker_heartbeat(self.worker_id, now, WorkerTelemetry::default()).await {
                        Ok(_) => consecutive_failures = 0,
                        Err(err) => {
                            consecutive_failures += 1;
                            tracing::warn!(error = %err, consecutive_failures, "heartbeat send failed");
                            if consecutive_failures >= self.config.max_heartbeat_failures {
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
            let lease = tokio::select! {
                _ = shutdown.cancelled() => return,
                lease = self.broker.lease(self.config.lease_timeout) => lease,
            };
            let job_id = match lease {
                Ok(Some(id)) => id,
                Ok(None) => continue,
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
    async fn execute_job(&self, job_id: orc_core::JobId) {
        // (i) claim the job for this worker.
        let job = match outcomes::claim_job(&*self.store, &self.clock, job_id, self.worker_id).await {
            Ok(job) => job,
            Err(_) => {
                // Someone else reclaimed it (heartbeat monitor, orphan sweep).
                let _ = self.broker.ack(job_id).await;
                return;
            }
        };

        // (ii) look up the handler.
        let Some(handler) = self.handlers.get(&job.job_type) else {
            if let Err(err) = outcomes::report_unknown_type(&*self.store, &self.clock, job.id).await {
                tracing::warn!(job_id = %job.id, error = %err, "failed to record unknown-type failure");
            }
            let _ = self.broker.ack(job_id).await;
            return;
        };

        // (iii) run with a timeout equal to the job's configured timeout.
        let outcome = tokio::time::timeout(job.timeout, handler.handle(job.payload.clone())).await;

        let result = match outcome {
            // (iv) success.
            Ok(Ok(result)) => outcomes::report_success(&*self.store, &self.clock, job.id, result).await,
            // (v) handler exception.
            Ok(Err(err)) => outcomes::report_failure(&*self.store, &*self.broker, &self.clock, job.id, err.to_string()).await,
            // (iii) timeout.
            Err(_) => outcomes::report_failure(&*self.store, &*self.broker, &self.clock, job.id, "TIMEOUT".to_string()).await,
        };
        if let Err(err) = result {
            tracing::warn!(job_id = %job.id, error = %err, "failed to record execution outcome");
        }

        // (vi) ack the broker regardless of outcome.
        let _ = self.broker.ack(job_id).await;
    }
}

#[cfg(test)]
#[path = "worker_runtime_tests.rs"]
mod tests;
