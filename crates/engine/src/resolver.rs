// SPDX-License-Identifier: MIT

//! The Dependency Resolver (`spec.md` §4.4): read-only queries over the
//! Durable Store answering "is this job ready" and "what's ready right now".
//!
//! This is deliberately separate from [`orc_storage::DurableStore::claim_ready_jobs`]:
//! the Scheduler's claim path takes exclusive row locks and mutates rows in
//! one transaction (`spec.md` §4.5), while this resolver only reads — used by
//! an operator inspecting why a job is stuck, and by the proptest suite to
//! check the "never SCHEDULED/RUNNING while a dependency is unsatisfied"
//! invariant (`spec.md` §8) against an arbitrary store snapshot.

use chrono::{DateTime, Utc};
use orc_core::{Job, JobId, JobStatus};
use orc_storage::{DurableStore, StoreResult};
use std::sync::Arc;

pub struct DependencyResolver<S> {
    store: Arc<S>,
}

impl<S: DurableStore> DependencyResolver<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// A job is ready iff it is PENDING, its `scheduled_at` has arrived, and
    /// every job it depends on is SUCCESS (`spec.md` §3, §4.4). Predecessors
    /// that are DEAD or CANCELED permanently block it; the resolver never
    /// mutates the dependent's status, matching the documented explicit
    /// failure-propagation policy.
    #[tracing::instrument(skip(self))]
    pub async fn is_ready(&self, job_id: JobId, now: DateTime<Utc>) -> StoreResult<bool> {
        let job = self.store.get_job(job_id).await?;
        Ok(self.job_is_ready(&job, now).await?)
    }

    async fn job_is_ready(&self, job: &Job, now: DateTime<Utc>) -> StoreResult<bool> {
        if job.status != JobStatus::Pending || job.scheduled_at > now {
            return Ok(false);
        }
        let deps = self.store.list_dependencies_of(job.id).await?;
        for dep_id in deps {
            let dep = self.store.get_job(dep_id).await?;
            if dep.status != JobStatus::Success {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Up to `limit` ready job ids, in the `spec.md` §4.5 total scheduling
    /// order: `(priority DESC, scheduled_at ASC, created_at ASC, job_id ASC)`.
    #[tracing::instrument(skip(self))]
    pub async fn ready_candidates(&self, limit: usize, now: DateTime<Utc>) -> StoreResult<Vec<JobId>> {
        let pending = self.store.list_pending_jobs().await?;
        let mut ready = Vec::with_capacity(pending.len());
        for job in pending {
            if self.job_is_ready(&job, now).await? {
                ready.push(job);
            }
        }
        ready.sort_by_key(|job| job.scheduling_key());
        ready.truncate(limit);
        Ok(ready.into_iter().map(|job| job.id).collect())
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
