// SPDX-License-Identifier: MIT

use super::*;
use crate::error::WorktreeError;
use crate::test_util::new_task;
use el_core::{FakeClock, WorktreeState};
use std::process::Command;
use tempfile::TempDir;

/// Engine over a real git repo with one initial commit.
fn git_engine() -> (crate::Engine<FakeClock>, TempDir) {
    let dir = TempDir::new().unwrap();
    let repo = dir.path();
    let git = |args: &[&str]| {
        let out = Command::new("git")
            .args(args)
            .current_dir(repo)
            .env_remove("GIT_DIR")
            .env_remove("GIT_WORK_TREE")
            .output()
            .unwrap();
        assert!(out.status.success(), "git {args:?}: {}", String::from_utf8_lossy(&out.stderr));
    };
    git(&["init", "-b", "main"]);
    git(&["config", "user.email", "test@example.com"]);
    git(&["config", "user.name", "test"]);
    std::fs::write(repo.join("README.md"), "seed\n").unwrap();
    git(&["add", "."]);
    git(&["commit", "-m", "seed"]);

    let engine = crate::Engine::open_with_clock(
        &repo.join(".elemental/store"),
        WorktreeConfig::new(repo),
        FakeClock::new(),
    )
    .unwrap();
    (engine, dir)
}

#[tokio::test]
async fn init_workspace_is_idempotent() {
    let (engine, dir) = git_engine();

    let default = engine.init_workspace().await.unwrap();
    assert_eq!(default, "main");
    assert!(dir.path().join(WORKTREES_DIR).is_dir());

    let gitignore = std::fs::read_to_string(dir.path().join(".gitignore")).unwrap();
    assert!(gitignore.contains(".elemental/.worktrees/"));

    // Second run changes nothing and still succeeds.
    engine.init_workspace().await.unwrap();
    let again = std::fs::read_to_string(dir.path().join(".gitignore")).unwrap();
    assert_eq!(gitignore, again);
}

#[tokio::test]
async fn init_requires_a_repository() {
    let dir = TempDir::new().unwrap();
    let engine = crate::Engine::open_with_clock(
        &dir.path().join("store"),
        WorktreeConfig::new(dir.path().join("not-a-repo")),
        FakeClock::new(),
    )
    .unwrap();
    assert!(matches!(
        engine.init_workspace().await,
        Err(WorktreeError::NoRepository(_))
    ));
}

#[tokio::test]
async fn create_worktree_checks_out_branch() {
    let (engine, dir) = git_engine();
    engine.init_workspace().await.unwrap();
    let task = engine.create(new_task("Fix login")).unwrap();

    let record = engine.create_worktree("claude", &task.id, Some("Fix login")).await.unwrap();
    assert_eq!(record.state, WorktreeState::Active);
    assert!(record.path.is_dir());
    assert!(record.head.is_some());
    assert_eq!(
        record.branch.as_deref(),
        Some(format!("agent/claude/{}-fix-login", task.id).as_str())
    );
    assert_eq!(record.task_id, Some(task.id));

    // Registered under the canonical path.
    assert!(engine.find_worktree(&record.path).is_some());
    let _ = dir;
}

#[tokio::test]
async fn second_worktree_at_same_path_is_refused() {
    let (engine, _dir) = git_engine();
    engine.init_workspace().await.unwrap();
    let task = engine.create(new_task("clash")).unwrap();

    engine.create_worktree("claude", &task.id, Some("clash")).await.unwrap();
    let err = engine.create_worktree("claude", &task.id, Some("clash")).await.unwrap_err();
    assert!(matches!(err, WorktreeError::PathInUse(_)));
}

#[tokio::test]
async fn failed_create_leaves_no_registry_entry() {
    let (engine, dir) = git_engine();
    engine.init_workspace().await.unwrap();
    let task = engine.create(new_task("doomed")).unwrap();

    // Occupy the branch with a conflicting ref state: make the branch
    // name already checked out in the main worktree.
    let repo = dir.path();
    let branch = branch_name("claude", task.id.as_str(), Some("doomed"));
    let out = Command::new("git")
        .args(["checkout", "-b", &branch])
        .current_dir(repo)
        .output()
        .unwrap();
    assert!(out.status.success());

    let err = engine.create_worktree("claude", &task.id, Some("doomed")).await.unwrap_err();
    assert!(matches!(err, WorktreeError::Git { .. }));

    let path = repo.join(relative_path("claude", Some("doomed")));
    assert!(engine.find_worktree(&path).is_none());
    assert!(!path.exists());
}

#[tokio::test]
async fn read_only_worktree_is_detached() {
    let (engine, _dir) = git_engine();
    engine.init_workspace().await.unwrap();

    let record = engine.create_read_only_worktree("triage", None).await.unwrap();
    assert_eq!(record.state, WorktreeState::Active);
    assert!(record.branch.is_none());
    assert!(record.head.is_some());
}

#[tokio::test]
async fn remove_worktree_refuses_main() {
    let (engine, dir) = git_engine();
    engine.init_workspace().await.unwrap();

    let err = engine.remove_worktree(dir.path(), false, None).await.unwrap_err();
    assert!(matches!(err, WorktreeError::MainWorktree));
}

#[tokio::test]
async fn remove_worktree_deletes_checkout_and_branch() {
    let (engine, dir) = git_engine();
    engine.init_workspace().await.unwrap();
    let task = engine.create(new_task("shortlived")).unwrap();

    let record = engine.create_worktree("claude", &task.id, Some("shortlived")).await.unwrap();
    let branch = record.branch.clone().unwrap();

    engine.remove_worktree(&record.path, false, Some(true)).await.unwrap();
    assert!(!record.path.exists());
    assert!(engine.find_worktree(&record.path).is_none());

    let out = Command::new("git")
        .args(["rev-parse", "--verify", &format!("refs/heads/{branch}")])
        .current_dir(dir.path())
        .output()
        .unwrap();
    assert!(!out.status.success(), "branch should be deleted");
}

#[tokio::test]
async fn remove_unknown_worktree_fails() {
    let (engine, dir) = git_engine();
    engine.init_workspace().await.unwrap();
    let err = engine
        .remove_worktree(&dir.path().join("nope"), false, None)
        .await
        .unwrap_err();
    assert!(matches!(err, WorktreeError::UnknownWorktree(_)));
}

#[tokio::test]
async fn state_transitions_are_guarded() {
    let (engine, _dir) = git_engine();
    engine.init_workspace().await.unwrap();
    let task = engine.create(new_task("stateful")).unwrap();
    let record = engine.create_worktree("claude", &task.id, None).await.unwrap();

    let suspended = engine.set_worktree_state(&record.path, WorktreeState::Suspended).unwrap();
    assert_eq!(suspended.state, WorktreeState::Suspended);

    // suspended → merging is not in the transition table.
    assert!(matches!(
        engine.set_worktree_state(&record.path, WorktreeState::Merging),
        Err(WorktreeError::BadTransition(_))
    ));

    let active = engine.set_worktree_state(&record.path, WorktreeState::Active).unwrap();
    assert_eq!(active.state, WorktreeState::Active);
}
