// SPDX-License-Identifier: MIT

//! Engine-wide tunables, loadable from the environment the way `orc-daemon`
//! resolves its own settings.

use std::time::Duration;

fn env_duration_ms(key: &str, default: Duration) -> Duration {
    std::env::var(key).ok().and_then(|s| s.parse::<u64>().ok()).map(Duration::from_millis).unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key).ok().and_then(|s| s.parse::<usize>().ok()).unwrap_or(default)
}

/// Scheduler tuning (`spec.md` §4.5).
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    /// How often the claim loop runs.
    pub tick: Duration,
    /// Maximum ready jobs claimed per tick (N in `spec.md` §4.5(a)).
    pub claim_batch_size: usize,
}

impl SchedulerConfig {
    pub fn from_env() -> Self {
        Self {
            tick: env_duration_ms("ORC_SCHEDULER_TICK_MS", Duration::from_millis(500)),
            claim_batch_size: env_usize("ORC_SCHEDULER_BATCH_SIZE", 100),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { tick: Duration::from_millis(500), claim_batch_size: 100 }
    }
}

/// Heartbeat Monitor tuning (`spec.md` §4.7). Defaults match the spec's own
/// defaults: tick T=30s, stale threshold H=90s, orphan grace 2T.
#[derive(Debug, Clone, Copy)]
pub struct HeartbeatConfig {
    pub tick: Duration,
    pub stale_threshold: Duration,
    pub orphan_grace: Duration,
    pub worker_cleanup_window: Duration,
}

impl HeartbeatConfig {
    pub fn from_env() -> Self {
        let tick = env_duration_ms("ORC_HEARTBEAT_TICK_MS", Duration::from_secs(30));
        Self {
            tick,
            stale_threshold: env_duration_ms("ORC_STALE_THRESHOLD_MS", Duration::from_secs(90)),
            orphan_grace: env_duration_ms("ORC_ORPHAN_GRACE_MS", tick * 2),
            worker_cleanup_window: env_duration_ms("ORC_WORKER_CLEANUP_MS", Duration::from_secs(3600)),
        }
    }
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        let tick = Duration::from_secs(30);
        Self {
            tick,
            stale_threshold: Duration::from_secs(90),
            orphan_grace: tick * 2,
            worker_cleanup_window: Duration::from_secs(3600),
        }
    }
}

/// Worker Runtime tuning (`spec.md` §4.8).
#[derive(Debug, Clone)]
pub struct WorkerRuntimeConfig {
    pub hostname: String,
    pub version: String,
    pub max_concurrent_jobs: u32,
    /// Heartbeat send interval T.
    pub heartbeat_interval: Duration,
    /// Consecutive heartbeat send failures before initiating graceful shutdown.
    pub max_heartbeat_failures: u32,
    /// Poll timeout passed to `lease()`.
    pub lease_timeout: Duration,
    /// How long graceful shutdown waits for in-flight executions.
    pub shutdown_deadline: Duration,
}

impl WorkerRuntimeConfig {
    pub fn from_env(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            max_concurrent_jobs: env_usize("ORC_WORKER_CONCURRENCY", 4) as u32,
            heartbeat_interval: env_duration_ms("ORC_HEARTBEAT_INTERVAL_MS", Duration::from_secs(30)),
            max_heartbeat_failures: env_usize("ORC_MAX_HEARTBEAT_FAILURES", 3) as u32,
            lease_timeout: env_duration_ms("ORC_LEASE_TIMEOUT_MS", Duration::from_secs(5)),
            shutdown_deadline: env_duration_ms("ORC_SHUTDOWN_DEADLINE_MS", Duration::from_secs(30)),
        }
    }
}
