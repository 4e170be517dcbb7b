// SPDX-License-Identifier: MIT

//! Daemon startup: acquires the lock file first (so a second `orcd` fails
//! fast instead of racing the first one), then wires the Durable Store and
//! Broker to the Scheduler and Heartbeat Monitor loops.

use crate::config::DaemonConfig;
use crate::listener::Listener;
use fs2::FileExt;
use orc_broker::InMemoryBroker;
use orc_core::SystemClock;
use orc_engine::{HeartbeatMonitor, Scheduler};
use orc_storage::InMemoryStore;
use std::io::Write;
use std::sync::Arc;
use tokio::net::UnixListener;
use tokio_util::sync::CancellationToken;

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("another orcd instance holds the lock at {0}")]
    LockFailed(std::path::PathBuf),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Remove a stale socket file left by a previous, uncleanly-stopped `orcd`.
/// Safe because the lock file acquired just before this is the real mutual
/// exclusion mechanism (`spec.md` doesn't cover deployment, but two `orcd`s
/// racing for the same socket path would otherwise fail to bind).
fn bind_socket(path: &std::path::Path) -> Result<UnixListener, LifecycleError> {
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    Ok(UnixListener::bind(path)?)
}

/// Acquire the exclusive lock file and write our PID into it. The returned
/// `File` must be kept alive for the lock to hold; dropping it releases it.
fn acquire_lock(config: &DaemonConfig) -> Result<std::fs::File, LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;
    let lock_file = std::fs::OpenOptions::new().write(true).create(true).truncate(false).open(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(|_| LifecycleError::LockFailed(config.lock_path.clone()))?;

    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    Ok(lock_file)
}

/// Run the daemon until `shutdown` is cancelled (normally by a Ctrl-C
/// listener in `main`). Returns once both background loops have stopped.
pub async fn run(config: DaemonConfig, shutdown: CancellationToken) -> Result<(), LifecycleError> {
    let _lock = acquire_lock(&config)?;
    tracing::info!(state_dir = %config.state_dir.display(), pid = std::process::id(), "orcd started");

    let store = Arc::new(InMemoryStore::new());
    let broker = Arc::new(InMemoryBroker::new());
    let clock = SystemClock;

    let unix = bind_socket(&config.socket_path)?;
    tracing::info!(socket = %config.socket_path.display(), "ipc listener bound");
    let listener = Listener::new(unix, store.clone(), broker.clone(), clock.clone());

    let scheduler = Scheduler::new(store.clone(), broker.clone(), clock.clone(), config.scheduler);
    let heartbeat = HeartbeatMonitor::new(store, broker, clock, config.heartbeat);

    let scheduler_task = tokio::spawn({
        let shutdown = shutdown.clone();
        async move { scheduler.run(shutdown).await }
    });
    let heartbeat_task = tokio::spawn({
        let shutdown = shutdown.clone();
        async move { heartbeat.run(shutdown).await }
    });
    let listener_task = tokio::spawn({
        let shutdown = shutdown.clone();
        async move { listener.run(shutdown).await }
    });

    shutdown.cancelled().await;
    let _ = tokio::join!(scheduler_task, heartbeat_task, listener_task);
    let _ = std::fs::remove_file(&config.socket_path);
    tracing::info!("orcd stopped");
    Ok(())
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
