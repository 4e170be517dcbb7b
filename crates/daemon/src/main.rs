// SPDX-License-Identifier: MIT

//! `orcd`: the orchestrator control-plane daemon. Runs the Scheduler and
//! Heartbeat Monitor loops until interrupted.

use orc_daemon::{run, DaemonConfig};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = DaemonConfig::from_env()?;
    let shutdown = CancellationToken::new();

    let ctrl_c_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received ctrl-c, shutting down");
            ctrl_c_token.cancel();
        }
    });

    run(config, shutdown).await?;
    Ok(())
}
