// SPDX-License-Identifier: MIT

//! Boundary error taxonomy (`spec.md` §6, §7).
//!
//! Every public operation on the Durable Store, Broker, Scheduler, and
//! Worker Runtime eventually surfaces one of these variants, so a caller at
//! any layer can match on a single error type instead of each component's
//! internal error enum.

use crate::job::JobStatus;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum OrchestratorError {
    #[error("not found")]
    NotFound,

    #[error("idempotency key already in use")]
    DuplicateIdempotency,

    #[error("workflow name already in use")]
    DuplicateName,

    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },

    #[error("update conflict: expected status {expected}, row was {actual}")]
    Conflict { expected: JobStatus, actual: JobStatus },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("dependency graph would become cyclic")]
    CycleDetected,

    #[error("store or broker unavailable: {0}")]
    Unavailable(String),
}

impl From<crate::job::InvalidTransition> for OrchestratorError {
    fn from(e: crate::job::InvalidTransition) -> Self {
        OrchestratorError::InvalidTransition { from: e.from, to: e.to }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_message_names_both_statuses() {
        let err = OrchestratorError::Conflict { expected: JobStatus::Pending, actual: JobStatus::Running };
        assert_eq!(err.to_string(), "update conflict: expected status pending, row was running");
    }

    #[test]
    fn invalid_transition_converts_from_state_machine_error() {
        let inner = crate::job::InvalidTransition { from: JobStatus::Success, to: JobStatus::Pending };
        let err: OrchestratorError = inner.into();
        assert!(matches!(err, OrchestratorError::InvalidTransition { .. }));
    }
}
