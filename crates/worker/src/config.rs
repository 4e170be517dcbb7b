// SPDX-License-Identifier: MIT

//! `orc-worker` process configuration: where to find `orcd`'s IPC socket,
//! plus the `spec.md` §4.8 Worker Runtime tunables.

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct WorkerProcessConfig {
    pub socket_path: PathBuf,
    pub runtime: orc_engine::WorkerRuntimeConfig,
}

impl WorkerProcessConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let state_dir = orc_daemon::config::state_dir().map_err(|_| ConfigError::NoStateDir)?;
        let socket_path = std::env::var("ORC_SOCKET_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| state_dir.join(orc_daemon::protocol::DEFAULT_SOCKET_NAME));
        let hostname = hostname();
        Ok(Self { socket_path, runtime: orc_engine::WorkerRuntimeConfig::from_env(hostname) })
    }
}

fn hostname() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .or_else(|| {
            std::process::Command::new("hostname")
                .output()
                .ok()
                .and_then(|out| String::from_utf8(out.stdout).ok())
                .map(|s| s.trim().to_string())
        })
        .unwrap_or_else(|| "unknown-host".to_string())
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not resolve a state directory (set ORC_STATE_DIR or HOME)")]
    NoStateDir,
}
