// SPDX-License-Identifier: MIT

//! Workflow fields and status machine.

use crate::element::{ElementId, Metadata};
use crate::task::TransitionError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl WorkflowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStatus::Pending => "pending",
            WorkflowStatus::Running => "running",
            WorkflowStatus::Completed => "completed",
            WorkflowStatus::Failed => "failed",
            WorkflowStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal states are immutable (soft delete excepted).
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            WorkflowStatus::Completed | WorkflowStatus::Failed | WorkflowStatus::Cancelled
        )
    }

    /// Allowed successors:
    ///
    /// ```text
    /// pending → running → {completed, failed, cancelled}
    /// pending → cancelled
    /// ```
    pub fn can_transition(self, to: WorkflowStatus) -> bool {
        use WorkflowStatus::*;
        if self == to {
            return true;
        }
        match (self, to) {
            (Pending, Running | Cancelled) => true,
            (Running, Completed | Failed | Cancelled) => true,
            _ => false,
        }
    }

    pub fn check_transition(self, to: WorkflowStatus) -> Result<(), TransitionError> {
        if self.can_transition(to) {
            Ok(())
        } else {
            Err(TransitionError::Workflow { from: self, to })
        }
    }

    pub fn parse(s: &str) -> Option<WorkflowStatus> {
        match s {
            "pending" => Some(WorkflowStatus::Pending),
            "running" => Some(WorkflowStatus::Running),
            "completed" => Some(WorkflowStatus::Completed),
            "failed" => Some(WorkflowStatus::Failed),
            "cancelled" => Some(WorkflowStatus::Cancelled),
            _ => None,
        }
    }
}

crate::simple_display! {
    WorkflowStatus {
        Pending => "pending",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Cancelled => "cancelled",
    }
}

/// Kind-specific fields of a `workflow` element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowFields {
    pub status: WorkflowStatus,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub ephemeral: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playbook_id: Option<ElementId>,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub variables: Metadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,
}

impl Default for WorkflowFields {
    fn default() -> Self {
        Self {
            status: WorkflowStatus::Pending,
            ephemeral: false,
            playbook_id: None,
            variables: Metadata::new(),
            started_at: None,
            finished_at: None,
            failure_reason: None,
            cancel_reason: None,
        }
    }
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
