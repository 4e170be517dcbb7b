// SPDX-License-Identifier: MIT

use clap::Parser;
use orc_cli::commands::{self, Cli};
use orc_cli::{ExitError, OrcClient};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("error: {err}");
        std::process::exit(err.code);
    }
}

async fn run(cli: Cli) -> Result<(), ExitError> {
    let socket_path = match cli.socket {
        Some(path) => path,
        None => resolve_socket_path()?,
    };
    let client = OrcClient::new(socket_path);
    commands::run(&client, cli.format, cli.command).await
}

fn resolve_socket_path() -> Result<std::path::PathBuf, ExitError> {
    if let Ok(path) = std::env::var("ORC_SOCKET_PATH") {
        return Ok(std::path::PathBuf::from(path));
    }
    let state_dir = orc_daemon::config::state_dir().map_err(|e| ExitError::new(1, e.to_string()))?;
    Ok(state_dir.join(orc_daemon::protocol::DEFAULT_SOCKET_NAME))
}
