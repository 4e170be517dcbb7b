// SPDX-License-Identifier: MIT

//! `orc-worker`: registers with `orcd` and executes leased jobs until told
//! to stop.

use orc_daemon::IpcClient;
use orc_engine::{EchoHandler, HandlerRegistry};
use orc_worker::{RemoteWorkerRuntime, WorkerProcessConfig};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = WorkerProcessConfig::from_env()?;
    let client = IpcClient::new(config.socket_path.clone());

    // Out of scope (`spec.md` §1): domain-specific handlers (email, ETL,
    // …) are an external collaborator. This process registers only the
    // reference `echo` handler used by `spec.md` §8 scenario 1; a real
    // deployment populates the registry at startup with its own handlers.
    let mut handlers = HandlerRegistry::new();
    handlers.register("echo", Arc::new(EchoHandler));

    let runtime = Arc::new(RemoteWorkerRuntime::register(client, config, handlers).await?);
    tracing::info!(worker_id = %runtime.worker_id(), "orc-worker registered");

    let shutdown = CancellationToken::new();
    let ctrl_c_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received ctrl-c, shutting down");
            ctrl_c_token.cancel();
        }
    });

    runtime.run(shutdown).await;
    Ok(())
}
