// SPDX-License-Identifier: MIT

use super::*;

#[yare::parameterized(
    pending_to_running = { WorkflowStatus::Pending, WorkflowStatus::Running, true },
    pending_to_cancelled = { WorkflowStatus::Pending, WorkflowStatus::Cancelled, true },
    running_to_completed = { WorkflowStatus::Running, WorkflowStatus::Completed, true },
    running_to_failed = { WorkflowStatus::Running, WorkflowStatus::Failed, true },
    running_to_cancelled = { WorkflowStatus::Running, WorkflowStatus::Cancelled, true },
    pending_to_completed = { WorkflowStatus::Pending, WorkflowStatus::Completed, false },
    completed_to_running = { WorkflowStatus::Completed, WorkflowStatus::Running, false },
    failed_to_running = { WorkflowStatus::Failed, WorkflowStatus::Running, false },
    cancelled_to_pending = { WorkflowStatus::Cancelled, WorkflowStatus::Pending, false },
)]
fn transitions(from: WorkflowStatus, to: WorkflowStatus, ok: bool) {
    assert_eq!(from.can_transition(to), ok, "{from} -> {to}");
}

#[test]
fn terminal_states() {
    assert!(!WorkflowStatus::Pending.is_terminal());
    assert!(!WorkflowStatus::Running.is_terminal());
    assert!(WorkflowStatus::Completed.is_terminal());
    assert!(WorkflowStatus::Failed.is_terminal());
    assert!(WorkflowStatus::Cancelled.is_terminal());
}

#[test]
fn terminal_self_transition_allowed() {
    // Same-status writes are no-ops, terminal or not.
    assert!(WorkflowStatus::Completed.can_transition(WorkflowStatus::Completed));
}

#[test]
fn parse_round_trips() {
    for status in [
        WorkflowStatus::Pending,
        WorkflowStatus::Running,
        WorkflowStatus::Completed,
        WorkflowStatus::Failed,
        WorkflowStatus::Cancelled,
    ] {
        assert_eq!(WorkflowStatus::parse(status.as_str()), Some(status));
    }
}

#[test]
fn default_fields() {
    let fields = WorkflowFields::default();
    assert_eq!(fields.status, WorkflowStatus::Pending);
    assert!(!fields.ephemeral);
    assert!(fields.playbook_id.is_none());
    assert!(fields.finished_at.is_none());
}
