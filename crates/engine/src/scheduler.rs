// SPDX-License-Identifier: MIT

//! The Scheduler (`spec.md` §4.5): claims ready jobs from the Durable Store
//! and hands them to the Broker. Safe to run as multiple identical
//! instances; correctness never depends on there being exactly one.

use crate::config::SchedulerConfig;
use crate::error::EngineError;
use orc_broker::QueueBroker;
use orc_core::Clock;
use orc_storage::DurableStore;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct Scheduler<S, B, C> {
    store: Arc<S>,
    broker: Arc<B>,
    clock: C,
    config: SchedulerConfig,
}

impl<S, B, C> Scheduler<S, B, C>
where
    S: DurableStore,
    B: QueueBroker,
    C: Clock,
{
    pub fn new(store: Arc<S>, broker: Arc<B>, clock: C, config: SchedulerConfig) -> Self {
        Self { store, broker, clock, config }
    }

    /// One scheduling pass: claim up to `claim_batch_size` ready jobs and
    /// enqueue each onto the Broker (`spec.md` §4.5 a-d).
    ///
    /// If step (d) — the broker enqueue — fails for a given job after the
    /// store commit in step (c), the job is left SCHEDULED; it is reclaimed
    /// later by the Heartbeat Monitor's orphan sweep, never retried here.
    #[tracing::instrument(skip(self))]
    pub async fn run_once(&self) -> Result<usize, EngineError> {
        let now = self.clock.now();
        let claimed = self.store.claim_ready_jobs(self.config.claim_batch_size, now).await?;
        let mut enqueued = 0;
        for job in &claimed {
            match self.broker.enqueue(job.id, job.priority).await {
                Ok(()) => enqueued += 1,
                Err(err) => {
                    tracing::warn!(job_id = %job.id, error = %err, "broker enqueue failed after claim, job left SCHEDULED for orphan sweep");
                }
            }
        }
        Ok(enqueued)
    }

    /// Run the claim loop until `shutdown` is cancelled.
    pub async fn run(&self, shutdown: CancellationToken) {
        let mut interval = tokio::time::interval(self.config.tick);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("scheduler stopping");
                    return;
                }
                _ = interval.tick() => {
                    if let Err(err) = self.run_once().await {
                        tracing::error!(error = %err, "scheduler tick failed");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
