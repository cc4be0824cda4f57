// SPDX-License-Identifier: MIT

//! Worktree event application. Keyed by canonical absolute path.

use super::MaterializedState;
use el_core::Event;

pub(super) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::WorktreeCreated { record } | Event::WorktreeUpdated { record } => {
            state
                .worktrees
                .insert(record.path.display().to_string(), record.clone());
        }

        Event::WorktreeRemoved { path } => {
            state.worktrees.remove(&path.display().to_string());
        }

        _ => {}
    }
}
