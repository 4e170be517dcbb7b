// SPDX-License-Identifier: MIT

//! Store-local error type. Converts into [`orc_core::OrchestratorError`] at
//! the boundary so callers above the store never match on storage internals.

use orc_core::JobStatus;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum StoreError {
    #[error("not found")]
    NotFound,

    #[error("idempotency key already in use")]
    DuplicateIdempotency,

    #[error("workflow name already in use")]
    DuplicateName,

    #[error("update conflict: expected status {expected}, row was {actual}")]
    Conflict { expected: JobStatus, actual: JobStatus },

    #[error("dependency graph would become cyclic")]
    CycleDetected,

    #[error("invalid transition: {0}")]
    InvalidTransition(#[from] orc_core::job::InvalidTransition),
}

impl From<StoreError> for orc_core::OrchestratorError {
    fn from(e: StoreError) -> Self {
        use orc_core::OrchestratorError as E;
        match e {
            StoreError::NotFound => E::NotFound,
            StoreError::DuplicateIdempotency => E::DuplicateIdempotency,
            StoreError::DuplicateName => E::DuplicateName,
            StoreError::Conflict { expected, actual } => E::Conflict { expected, actual },
            StoreError::CycleDetected => E::CycleDetected,
            StoreError::InvalidTransition(inner) => inner.into(),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
