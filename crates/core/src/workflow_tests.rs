// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn empty_workflow_is_pending() {
    let (status, counts) = aggregate_status([]);
    assert_eq!(status, WorkflowStatus::Pending);
    assert_eq!(counts.total(), 0);
}

#[test]
fn all_success_is_completed() {
    let (status, _) = aggregate_status([JobStatus::Success, JobStatus::Success]);
    assert_eq!(status, WorkflowStatus::Completed);
}

#[test]
fn any_dead_is_failed_even_with_successes() {
    let (status, _) = aggregate_status([JobStatus::Success, JobStatus::Dead, JobStatus::Running]);
    assert_eq!(status, WorkflowStatus::Failed);
}

#[test]
fn in_flight_job_marks_running() {
    let (status, _) = aggregate_status([JobStatus::Success, JobStatus::Retrying]);
    assert_eq!(status, WorkflowStatus::Running);

    let (status, _) = aggregate_status([JobStatus::Scheduled]);
    assert_eq!(status, WorkflowStatus::Running);

    let (status, _) = aggregate_status([JobStatus::Running]);
    assert_eq!(status, WorkflowStatus::Running);
}

#[test]
fn success_and_canceled_mix_is_completed() {
    let (status, _) = aggregate_status([JobStatus::Success, JobStatus::Canceled, JobStatus::Canceled]);
    assert_eq!(status, WorkflowStatus::Completed);
}

#[test]
fn all_canceled_is_completed() {
    let (status, _) = aggregate_status([JobStatus::Canceled, JobStatus::Canceled]);
    assert_eq!(status, WorkflowStatus::Completed);
}

#[test]
fn only_pending_jobs_is_pending() {
    let (status, _) = aggregate_status([JobStatus::Pending, JobStatus::Pending]);
    assert_eq!(status, WorkflowStatus::Pending);
}

#[test]
fn pending_mixed_with_failed_is_pending_not_running() {
    // FAILED is a transient state (about to retry or die); it doesn't count
    // as "in flight" for the RUNNING rule, and it isn't DEAD yet either.
    let (status, _) = aggregate_status([JobStatus::Pending, JobStatus::Failed]);
    assert_eq!(status, WorkflowStatus::Pending);
}
