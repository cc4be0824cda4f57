// SPDX-License-Identifier: MIT

//! Engine error types, mapped by adapters onto the stable code table.

use el_core::{ElementId, GateError, SessionTransitionError, TransitionError};
use el_store::StoreError;
use thiserror::Error;

/// Errors from element API operations.
#[derive(Debug, Error)]
pub enum ElementError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("version conflict on {id}: expected {expected}, actual {actual}")]
    ConcurrentModification { id: ElementId, expected: u64, actual: u64 },

    #[error("dependency would create a cycle: {0}")]
    CycleDetected(String),

    #[error("dependency already exists: {0}")]
    DuplicateDependency(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("storage failure: {0}")]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<TransitionError> for ElementError {
    fn from(e: TransitionError) -> Self {
        ElementError::Validation(e.to_string())
    }
}

impl From<SessionTransitionError> for ElementError {
    fn from(e: SessionTransitionError) -> Self {
        ElementError::Validation(e.to_string())
    }
}

impl From<GateError> for ElementError {
    fn from(e: GateError) -> Self {
        ElementError::Validation(e.to_string())
    }
}

impl From<el_playbook::PourError> for ElementError {
    fn from(e: el_playbook::PourError) -> Self {
        ElementError::Validation(e.to_string())
    }
}

/// Errors from worktree operations.
#[derive(Debug, Error)]
pub enum WorktreeError {
    #[error("no git repository at {0}")]
    NoRepository(String),

    #[error("worktree path already in use: {0}")]
    PathInUse(String),

    #[error("refusing to remove the main worktree")]
    MainWorktree,

    #[error("unknown worktree: {0}")]
    UnknownWorktree(String),

    #[error("git {command} failed: {stderr}")]
    Git { command: String, stderr: String },

    #[error("invalid worktree state transition: {0}")]
    BadTransition(#[from] el_core::WorktreeTransitionError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage failure: {0}")]
    Store(#[from] StoreError),
}
