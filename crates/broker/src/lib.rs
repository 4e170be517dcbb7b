// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! orc-broker: the Queue/Lease Broker contract (`spec.md` §4.2) and an
//! in-memory reference implementation.
//!
//! The broker is advisory: it hosts a priority-ordered collection of ready
//! job identifiers and a dead-letter collection. Losing an entry must never
//! corrupt the Durable Store, only delay scheduling until the Heartbeat
//! Monitor's orphan sweep reclaims the job (`spec.md` §4.2, §4.5).

mod memory;

use async_trait::async_trait;
use orc_core::JobId;
use std::time::Duration;
use thiserror::Error;

pub use memory::InMemoryBroker;

#[derive(Debug, Error, Clone)]
pub enum BrokerError {
    #[error("broker unavailable: {0}")]
    Unavailable(String),
}

pub type BrokerResult<T> = Result<T, BrokerError>;

/// A staged dead-letter record: the job identifier plus the reason it was
/// dead-lettered (`spec.md` §4.2).
#[derive(Debug, Clone)]
pub struct DeadLetterEntry {
    pub job_id: JobId,
    pub reason: String,
}

/// Ready-queue and dead-letter-queue depth, surfaced by `get-queue-stats`
/// (`spec.md` §6).
#[derive(Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize)]
pub struct QueueStats {
    pub ready_len: usize,
    pub dlq_len: usize,
}

#[async_trait]
pub trait QueueBroker: Send + Sync {
    /// Idempotent on `job_id`: re-enqueuing an id already present is a no-op.
    async fn enqueue(&self, job_id: JobId, priority: u8) -> BrokerResult<()>;

    /// Returns the next job under priority order (higher first, FIFO within
    /// a priority tier), atomically removing it from the ready collection.
    /// Returns `None` if `timeout` elapses with nothing ready.
    async fn lease(&self, timeout: Duration) -> BrokerResult<Option<JobId>>;

    /// Returns a leased entry to the ready collection (e.g. a worker lost
    /// the CAS race to claim it).
    async fn requeue(&self, job_id: JobId, priority: u8) -> BrokerResult<()>;

    /// No-op confirmation that a leased entry was handled.
    async fn ack(&self, job_id: JobId) -> BrokerResult<()>;

    async fn send_to_dlq(&self, job_id: JobId, reason: String) -> BrokerResult<()>;

    async fn list_dlq(&self) -> BrokerResult<Vec<DeadLetterEntry>>;

    /// Clears only the ready collection. Operator-only; never touches the
    /// Durable Store (`spec.md` §6).
    async fn purge(&self) -> BrokerResult<()>;

    async fn get_queue_stats(&self) -> BrokerResult<QueueStats>;
}
