// SPDX-License-Identifier: MIT

//! Single-process [`QueueBroker`] backed by a binary heap, for tests and for
//! `orc-daemon`/`orc-worker` run without an external broker (e.g. Redis).

use crate::{BrokerResult, DeadLetterEntry, QueueBroker, QueueStats};
use async_trait::async_trait;
use orc_core::JobId;
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::timeout as tokio_timeout;

#[derive(Debug, Eq, PartialEq)]
struct Entry {
    priority: u8,
    // Lower sequence enqueued earlier; break priority ties FIFO.
    sequence: u64,
    job_id: JobId,
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Default)]
struct Inner {
    ready: BinaryHeap<Entry>,
    ready_ids: HashSet<JobId>,
    dlq: Vec<DeadLetterEntry>,
    next_sequence: u64,
}

/// In-memory reference implementation of [`QueueBroker`].
pub struct InMemoryBroker {
    inner: Mutex<Inner>,
    notify: Notify,
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self { inner: Mutex::new(Inner::default()), notify: Notify::new() }
    }

    fn pop_ready(&self) -> Option<JobId> {
        let mut inner = self.inner.lock();
        let entry = inner.ready.pop()?;
        inner.ready_ids.remove(&entry.job_id);
        Some(entry.job_id)
    }

    fn push_ready(&self, job_id: JobId, priority: u8) {
        let mut inner = self.inner.lock();
        if !inner.ready_ids.insert(job_id) {
            return;
        }
        let sequence = inner.next_sequence;
        inner.next_sequence += 1;
        inner.ready.push(Entry { priority, sequence, job_id });
    }
}

#[async_trait]
impl QueueBroker for InMemoryBroker {
    #[tracing::instrument(skip(self))]
    async fn enqueue(&self, job_id: JobId, priority: u8) -> BrokerResult<()> {
        self.push_ready(job_id, priority);
        self.notify.notify_one();
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn lease(&self, timeout: Duration) -> BrokerResult<Option<JobId>> {
        if let Some(id) = self.pop_ready() {
            return Ok(Some(id));
        }
        // Long-poll: wait for a notification or give up at the timeout, the
        // broker's own poll bound so it stays responsive to shutdown
        // (`spec.md` §5 timeouts).
        let _ = tokio_timeout(timeout, self.notify.notified()).await;
        Ok(self.pop_ready())
    }

    #[tracing::instrument(skip(self))]
    async fn requeue(&self, job_id: JobId, priority: u8) -> BrokerResult<()> {
        self.push_ready(job_id, priority);
        self.notify.notify_one();
        Ok(())
    }

    async fn ack(&self, _job_id: JobId) -> BrokerResult<()> {
        Ok(())
    }

    #[tracing::instrument(skip(self, reason))]
    async fn send_to_dlq(&self, job_id: JobId, reason: String) -> BrokerResult<()> {
        let mut inner = self.inner.lock();
        inner.ready_ids.remove(&job_id);
        inner.dlq.push(DeadLetterEntry { job_id, reason });
        Ok(())
    }

    async fn list_dlq(&self) -> BrokerResult<Vec<DeadLetterEntry>> {
        Ok(self.inner.lock().dlq.clone())
    }

    async fn purge(&self) -> BrokerResult<()> {
        let mut inner = self.inner.lock();
        inner.ready.clear();
        inner.ready_ids.clear();
        Ok(())
    }

    async fn get_queue_stats(&self) -> BrokerResult<QueueStats> {
        let inner = self.inner.lock();
        Ok(QueueStats { ready_len: inner.ready.len(), dlq_len: inner.dlq.len() })
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
