// SPDX-License-Identifier: MIT

//! Worker identifier and registry record (`spec.md` §3).

use crate::id::define_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

define_id! {
    /// Unique identifier for a worker process. Opaque 128-bit (v4 UUID).
    pub struct WorkerId;
}

impl WorkerId {
    /// Placeholder `worker_id` the Scheduler writes on a SCHEDULED job
    /// meaning "claimed, in the broker, not yet leased by a live worker"
    /// (`spec.md` §4.5(b)). Never assigned to an actual registered worker.
    pub fn in_broker_sentinel() -> Self {
        Self::from_uuid(uuid::Uuid::nil())
    }
}

/// Liveness status of a worker record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerStatus {
    Active,
    Stale,
    Stopped,
}

crate::simple_display! {
    WorkerStatus {
        Active => "active",
        Stale => "stale",
        Stopped => "stopped",
    }
}

/// Optional process telemetry attached to a heartbeat (`spec.md` §6).
/// Stored but never consulted by control decisions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkerTelemetry {
    pub cpu_percent: Option<f32>,
    pub memory_bytes: Option<u64>,
}

/// A worker registry row (`spec.md` §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worker {
    pub id: WorkerId,
    pub hostname: String,
    pub process_id: u32,
    pub version: String,
    pub max_concurrent_jobs: u32,
    pub status: WorkerStatus,
    pub last_heartbeat: DateTime<Utc>,
    pub telemetry: WorkerTelemetry,
    pub registered_at: DateTime<Utc>,
}

impl Worker {
    pub fn register(
        hostname: impl Into<String>,
        process_id: u32,
        version: impl Into<String>,
        max_concurrent_jobs: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: WorkerId::new(),
            hostname: hostname.into(),
            process_id,
            version: version.into(),
            max_concurrent_jobs,
            status: WorkerStatus::Active,
            last_heartbeat: now,
            telemetry: WorkerTelemetry::default(),
            registered_at: now,
        }
    }

    /// Is this worker's last heartbeat older than the stale threshold at `now`?
    pub fn is_stale(&self, now: DateTime<Utc>, threshold: std::time::Duration) -> bool {
        match chrono::Duration::from_std(threshold) {
            Ok(threshold) => now - self.last_heartbeat > threshold,
            Err(_) => false,
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
crate::builder! {
    pub struct WorkerBuilder => Worker {
        into {
            hostname: String = "test-host",
            version: String = "0.1.0",
        }
        set {
            id: WorkerId = WorkerId::new(),
            process_id: u32 = 1,
            max_concurrent_jobs: u32 = 4,
            status: WorkerStatus = WorkerStatus::Active,
            last_heartbeat: DateTime<Utc> = Utc::now(),
            telemetry: WorkerTelemetry = WorkerTelemetry::default(),
            registered_at: DateTime<Utc> = Utc::now(),
        }
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
