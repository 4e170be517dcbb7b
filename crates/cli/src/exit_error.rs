// SPDX-License-Identifier: MIT

//! Custom error type that carries a process exit code.
//!
//! Commands return `ExitError` instead of calling `std::process::exit()`
//! directly, so `main()` is the only place that terminates the process.

use std::fmt;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}

impl From<orc_daemon::ClientError> for ExitError {
    fn from(err: orc_daemon::ClientError) -> Self {
        let code = match &err {
            orc_daemon::ClientError::Remote { kind, .. } => match kind.as_str() {
                "not_found" => 2,
                "duplicate_idempotency" | "duplicate_name" | "conflict" | "invalid_transition" | "cycle_detected" => 3,
                "validation" => 4,
                _ => 1,
            },
            _ => 1,
        };
        Self::new(code, err.to_string())
    }
}
