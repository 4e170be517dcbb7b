// SPDX-License-Identifier: MIT

//! Dependency edge between two jobs in the same workflow (`spec.md` §3, §4.4).

use crate::job::JobId;
use serde::{Deserialize, Serialize};

/// A directed edge `job_id -> depends_on_job_id`. `job_id` is ready only once
/// every job it depends on reaches SUCCESS (`spec.md` §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub job_id: JobId,
    pub depends_on_job_id: JobId,
}

impl DependencyEdge {
    pub fn new(job_id: JobId, depends_on_job_id: JobId) -> Self {
        Self { job_id, depends_on_job_id }
    }
}
