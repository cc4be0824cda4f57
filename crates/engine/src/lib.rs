// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! el-engine: the Elemental core engine.
//!
//! Owns the element API (CRUD + dependency edges), the blocked cache,
//! ready/blocked queries, workflow pour/squash/burn/gc, and the git
//! worktree manager. The daemon wires this up behind HTTP; the engine
//! itself is synchronous over a single state mutex, with async only at
//! the worktree boundary where git runs.

pub mod api;
pub mod blocked;
pub mod bus;
pub mod engine;
pub mod error;
pub mod sessions;
pub mod tasks;
pub mod workflow;
pub mod worktree;

#[cfg(test)]
mod test_util;

pub use api::{DependencyTreeNode, ElementFilter, ElementPatch, NewElement, Page};
pub use bus::{ChangeAction, ChangeEvent, EventBus};
pub use engine::Engine;
pub use error::{ElementError, WorktreeError};
pub use sessions::SessionFilter;
pub use tasks::{BlockedTask, TaskFilter};
pub use workflow::{GcReport, PourOutcome, WorkflowProgress};
pub use worktree::{WorktreeConfig, WORKTREES_DIR};
