// SPDX-License-Identifier: MIT

//! Daemon configuration, resolved from the environment (`ORC_STATE_DIR`
//! etc.), the way `orc-daemon`'s predecessor resolves its own settings.

use std::path::PathBuf;

/// Resolve state directory: `ORC_STATE_DIR` > `XDG_STATE_HOME`/orc > `~/.local/state/orc`.
pub fn state_dir() -> Result<PathBuf, ConfigError> {
    if let Ok(dir) = std::env::var("ORC_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("orc"));
    }
    let home = std::env::var("HOME").map_err(|_| ConfigError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/orc"))
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not resolve a state directory (set ORC_STATE_DIR or HOME)")]
    NoStateDir,
}

/// Resolved daemon configuration.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub state_dir: PathBuf,
    pub lock_path: PathBuf,
    pub socket_path: PathBuf,
    pub scheduler: orc_engine::SchedulerConfig,
    pub heartbeat: orc_engine::HeartbeatConfig,
}

impl DaemonConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let state_dir = state_dir()?;
        let socket_path = std::env::var("ORC_SOCKET_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| state_dir.join(crate::protocol::DEFAULT_SOCKET_NAME));
        Ok(Self {
            lock_path: state_dir.join("orcd.lock"),
            socket_path,
            state_dir,
            scheduler: orc_engine::SchedulerConfig::from_env(),
            heartbeat: orc_engine::HeartbeatConfig::from_env(),
        })
    }
}
