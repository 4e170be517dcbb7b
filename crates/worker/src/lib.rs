// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! orc-worker: a standalone `spec.md` §4.8 Worker Runtime process. Connects
//! to `orcd` over its IPC socket and runs the heartbeat emitter, lease loop,
//! and execution activity described there, so the control plane and its
//! worker pool can scale independently (`spec.md` §5).

pub mod config;
pub mod error;
pub mod runtime;

pub use config::WorkerProcessConfig;
pub use error::WorkerError;
pub use runtime::RemoteWorkerRuntime;
