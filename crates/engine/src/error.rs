// SPDX-License-Identifier: MIT

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum EngineError {
    #[error("store error: {0}")]
    Store(#[from] orc_storage::StoreError),

    #[error("broker error: {0}")]
    Broker(#[from] orc_broker::BrokerError),

    #[error("no handler registered for job type {0:?}")]
    UnknownType(String),
}

impl From<EngineError> for orc_core::OrchestratorError {
    fn from(e: EngineError) -> Self {
        use orc_core::OrchestratorError as E;
        match e {
            EngineError::Store(inner) => inner.into(),
            EngineError::Broker(inner) => E::Unavailable(inner.to_string()),
            EngineError::UnknownType(job_type) => E::Validation(format!("unknown job type: {job_type}")),
        }
    }
}
