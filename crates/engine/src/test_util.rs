// SPDX-License-Identifier: MIT

//! Shared fixtures for engine tests.

use crate::api::NewElement;
use crate::engine::Engine;
use crate::worktree::WorktreeConfig;
use el_core::test_support::actor;
use el_core::{ElementBody, FakeClock, TaskFields};
use tempfile::TempDir;

pub(crate) fn test_engine() -> (Engine<FakeClock>, TempDir) {
    let dir = TempDir::new().unwrap();
    let engine = Engine::open_with_clock(
        &dir.path().join("state"),
        WorktreeConfig::new(dir.path()),
        FakeClock::new(),
    )
    .unwrap();
    (engine, dir)
}

pub(crate) fn new_task(title: &str) -> NewElement {
    NewElement::new(title, actor(), ElementBody::Task(TaskFields::default()))
}
