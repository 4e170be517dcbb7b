// SPDX-License-Identifier: MIT

//! The Heartbeat Monitor (`spec.md` §4.7): detects stale worker leases and
//! reclaims their jobs, sweeps orphaned SCHEDULED claims, and garbage
//! collects long-stopped worker records.

use crate::config::HeartbeatConfig;
use crate::error::EngineError;
use orc_broker::QueueBroker;
use orc_core::Clock;
use orc_storage::DurableStore;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, Default)]
pub struct HeartbeatTickReport {
    pub marked_stale: usize,
    pub requeued: usize,
    pub dead_lettered: usize,
    pub orphans_swept: usize,
    pub workers_removed: usize,
}

pub struct HeartbeatMonitor<S, B, C> {
    store: Arc<S>,
    broker: Arc<B>,
    clock: C,
    config: HeartbeatConfig,
}

impl<S, B, C> HeartbeatMonitor<S, B, C>
where
    S: DurableStore,
    B: QueueBroker,
    C: Clock,
{
    pub fn new(store: Arc<S>, broker: Arc<B>, clock: C, config: HeartbeatConfig) -> Self {
        Self { store, broker, clock, config }
    }

    /// One monitor tick, `spec.md` §4.7 (a)-(d).
    #[tracing::instrument(skip(self))]
    pub async fn run_once(&self) -> Result<HeartbeatTickReport, EngineError> {
        let now = self.clock.now();
        let mut report = HeartbeatTickReport::default();

        // (a) mark stale workers.
        let stale = self.store.list_stale_workers(now, self.config.stale_threshold).await?;
        for worker in &stale {
            self.store.mark_worker_stale(worker.id).await?;
            report.marked_stale += 1;

            // (b) reassign every in-flight job that worker owned.
            let reassignment = self.store.reassign_jobs_of_worker(worker.id, now).await?;
            report.requeued += reassignment.requeued.len();
            for job_id in &reassignment.dead_lettered {
                self.broker.send_to_dlq(*job_id, "worker heartbeat expired, retries exhausted".to_string()).await?;
            }
            report.dead_lettered += reassignment.dead_lettered.len();
        }

        // (c) sweep orphan SCHEDULED jobs (crash between store commit and broker enqueue).
        let orphans = self.store.sweep_orphan_scheduled(self.config.orphan_grace, now).await?;
        report.orphans_swept = orphans.len();

        // (d) remove worker records STOPPED longer than the cleanup window.
        let removed = self.store.remove_stopped_workers(now, self.config.worker_cleanup_window).await?;
        report.workers_removed = removed.len();

        Ok(report)
    }

    pub async fn run(&self, shutdown: CancellationToken) {
        let mut interval = tokio::time::interval(self.config.tick);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("heartbeat monitor stopping");
                    return;
                }
                _ = interval.tick() => {
                    match self.run_once().await {
                        Ok(report) => tracing::debug!(?report, "heartbeat tick complete"),
                        Err(err) => tracing::error!(error = %err, "heartbeat tick failed"),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "heartbeat_tests.rs"]
mod tests;
