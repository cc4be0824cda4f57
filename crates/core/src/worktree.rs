// SPDX-License-Identifier: MIT

//! Worktree records and their table-driven state machine.

use crate::element::ElementId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorktreeState {
    Creating,
    Active,
    Suspended,
    Merging,
    Cleaning,
    Archived,
}

/// Allowed transitions, one row per source state.
const TRANSITIONS: &[(WorktreeState, &[WorktreeState])] = {
    use WorktreeState::*;
    &[
        (Creating, &[Active, Cleaning]),
        (Active, &[Suspended, Merging, Cleaning]),
        (Suspended, &[Active, Cleaning]),
        (Merging, &[Archived, Cleaning, Active]),
        (Cleaning, &[Archived]),
        (Archived, &[]),
    ]
};

impl WorktreeState {
    pub fn allowed_successors(self) -> &'static [WorktreeState] {
        TRANSITIONS
            .iter()
            .find(|(from, _)| *from == self)
            .map(|(_, to)| *to)
            .unwrap_or(&[])
    }

    pub fn can_transition(self, to: WorktreeState) -> bool {
        self.allowed_successors().contains(&to)
    }

    pub fn check_transition(self, to: WorktreeState) -> Result<(), WorktreeTransitionError> {
        if self.can_transition(to) {
            Ok(())
        } else {
            Err(WorktreeTransitionError { from: self, to })
        }
    }
}

crate::simple_display! {
    WorktreeState {
        Creating => "creating",
        Active => "active",
        Suspended => "suspended",
        Merging => "merging",
        Cleaning => "cleaning",
        Archived => "archived",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid worktree state transition: {from} -> {to}")]
pub struct WorktreeTransitionError {
    pub from: WorktreeState,
    pub to: WorktreeState,
}

/// One managed git worktree.
///
/// `path` is absolute and canonicalized; it is the registry key, so all
/// comparisons against it must canonicalize first (symlinked tmp dirs).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorktreeRecord {
    pub path: PathBuf,
    pub relative_path: PathBuf,
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_main: bool,
    pub state: WorktreeState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<ElementId>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[path = "worktree_tests.rs"]
mod tests;
