// SPDX-License-Identifier: MIT

//! Task fields and status machine.

use crate::element::EntityId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Task status. Soft deletion is tracked on the element envelope, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Open,
    InProgress,
    Blocked,
    Deferred,
    Closed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Open => "open",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Blocked => "blocked",
            TaskStatus::Deferred => "deferred",
            TaskStatus::Closed => "closed",
        }
    }

    /// Allowed successors:
    ///
    /// ```text
    /// open ↔ in_progress ↔ blocked
    /// open, in_progress, blocked → deferred → open
    /// any non-closed → closed → open
    /// ```
    pub fn can_transition(self, to: TaskStatus) -> bool {
        use TaskStatus::*;
        if self == to {
            return true;
        }
        match (self, to) {
            (Open, InProgress) | (InProgress, Open) => true,
            (InProgress, Blocked) | (Blocked, InProgress) => true,
            (Open | InProgress | Blocked, Deferred) => true,
            (Deferred, Open) => true,
            (Open | InProgress | Blocked | Deferred, Closed) => true,
            (Closed, Open) => true,
            _ => false,
        }
    }

    pub fn check_transition(self, to: TaskStatus) -> Result<(), TransitionError> {
        if self.can_transition(to) {
            Ok(())
        } else {
            Err(TransitionError::Task { from: self, to })
        }
    }

    pub fn parse(s: &str) -> Option<TaskStatus> {
        match s {
            "open" => Some(TaskStatus::Open),
            "in_progress" => Some(TaskStatus::InProgress),
            "blocked" => Some(TaskStatus::Blocked),
            "deferred" => Some(TaskStatus::Deferred),
            "closed" => Some(TaskStatus::Closed),
            _ => None,
        }
    }
}

crate::simple_display! {
    TaskStatus {
        Open => "open",
        InProgress => "in_progress",
        Blocked => "blocked",
        Deferred => "deferred",
        Closed => "closed",
    }
}

/// Illegal status transition, reported as a validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("invalid task status transition: {from} -> {to}")]
    Task { from: TaskStatus, to: TaskStatus },
    #[error("invalid workflow status transition: {from} -> {to}")]
    Workflow {
        from: crate::workflow::WorkflowStatus,
        to: crate::workflow::WorkflowStatus,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Bug,
    Feature,
    Task,
    Chore,
}

impl Default for TaskType {
    fn default() -> Self {
        TaskType::Task
    }
}

crate::simple_display! {
    TaskType {
        Bug => "bug",
        Feature => "feature",
        Task => "task",
        Chore => "chore",
    }
}

/// Priority and complexity share the 1..=5 scale (1 = critical/trivial).
pub const SCALE_MIN: u8 = 1;
pub const SCALE_MAX: u8 = 5;
pub const DEFAULT_PRIORITY: u8 = 3;
pub const DEFAULT_COMPLEXITY: u8 = 3;

pub fn valid_scale(v: u8) -> bool {
    (SCALE_MIN..=SCALE_MAX).contains(&v)
}

/// Kind-specific fields of a `task` element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFields {
    pub status: TaskStatus,
    pub priority: u8,
    pub complexity: u8,
    pub task_type: TaskType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_reason: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub ephemeral: bool,
}

impl Default for TaskFields {
    fn default() -> Self {
        Self {
            status: TaskStatus::Open,
            priority: DEFAULT_PRIORITY,
            complexity: DEFAULT_COMPLEXITY,
            task_type: TaskType::default(),
            description: None,
            assignee: None,
            owner: None,
            scheduled_for: None,
            deadline: None,
            close_reason: None,
            ephemeral: false,
        }
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
