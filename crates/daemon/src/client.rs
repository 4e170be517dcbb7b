// SPDX-License-Identifier: MIT

//! A thin client for `orcd`'s IPC socket, shared by `orc-cli` and
//! `orc-worker` so neither has to reimplement the wire format.
//!
//! One connection per call: simplicity over throughput, since neither
//! client is call-rate sensitive (a human running `orc` commands, or a
//! worker leasing at most a few jobs per second per concurrency slot).

use crate::protocol::{read_frame, write_frame, Request, Response};
use std::path::{Path, PathBuf};
use tokio::io::BufReader;
use tokio::net::UnixStream;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    #[error("could not connect to orcd at {path}: {source}")]
    Connect { path: PathBuf, source: String },

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("orcd closed the connection without a response")]
    NoResponse,

    #[error("unexpected response shape")]
    UnexpectedResponse,

    #[error("{kind}: {message}")]
    Remote { kind: String, message: String },
}

impl From<crate::protocol::ProtocolError> for ClientError {
    fn from(e: crate::protocol::ProtocolError) -> Self {
        ClientError::Protocol(e.0)
    }
}

/// Connects to `orcd` over a Unix domain socket and exchanges one
/// [`Request`]/[`Response`] pair.
#[derive(Debug, Clone)]
pub struct IpcClient {
    socket_path: PathBuf,
}

impl IpcClient {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self { socket_path: socket_path.into() }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Send `request` and return the raw [`Response`]; callers peel off the
    /// variant they expect and turn [`Response::Error`] into their own error
    /// type (see `orc-cli`'s and `orc-worker`'s wrapper methods).
    pub async fn call(&self, request: &Request) -> Result<Response, ClientError> {
        let stream = UnixStream::connect(&self.socket_path).await.map_err(|e| ClientError::Connect {
            path: self.socket_path.clone(),
            source: e.to_string(),
        })?;
        let (read_half, mut write_half) = stream.into_split();
        write_frame(&mut write_half, request).await?;
        let mut reader = BufReader::new(read_half);
        read_frame::<Response, _>(&mut reader).await?.ok_or(ClientError::NoResponse)
    }
}

/// Turn an error [`Response`] into a [`ClientError::Remote`]; returns the
/// input unchanged (as `Ok`) for anything else so callers can match further.
pub fn reject_error(response: Response) -> Result<Response, ClientError> {
    match response {
        Response::Error(payload) => Err(ClientError::Remote { kind: payload.kind, message: payload.message }),
        other => Ok(other),
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
