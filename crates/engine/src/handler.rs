// SPDX-License-Identifier: MIT

//! Job handler registry (`spec.md` §4.8(ii)): maps a job's `job_type` to the
//! code that executes it.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct HandlerError(pub String);

impl HandlerError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Executes a job's payload and returns the result blob recorded on success.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, payload: serde_json::Value) -> Result<serde_json::Value, HandlerError>;
}

/// Registry of job handlers keyed by `job_type`.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn JobHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, job_type: impl Into<String>, handler: Arc<dyn JobHandler>) {
        self.handlers.insert(job_type.into(), handler);
    }

    pub fn get(&self, job_type: &str) -> Option<Arc<dyn JobHandler>> {
        self.handlers.get(job_type).cloned()
    }
}

/// A handler that echoes its payload back as the result, used in tests and
/// as the default handler for the `echo` job type (`spec.md` §8 scenario 1).
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoHandler;

#[async_trait]
impl JobHandler for EchoHandler {
    async fn handle(&self, payload: serde_json::Value) -> Result<serde_json::Value, HandlerError> {
        Ok(payload)
    }
}

/// A handler that always fails, used in tests to exercise the retry/DLQ path
/// (`spec.md` §8 scenario 2).
#[derive(Debug, Clone, Default)]
pub struct AlwaysFailHandler {
    pub reason: String,
}

#[async_trait]
impl JobHandler for AlwaysFailHandler {
    async fn handle(&self, _payload: serde_json::Value) -> Result<serde_json::Value, HandlerError> {
        Err(HandlerError::new(self.reason.clone()))
    }
}
