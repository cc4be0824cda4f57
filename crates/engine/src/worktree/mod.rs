// SPDX-License-Identifier: MIT

//! Git worktree manager.
//!
//! Records live in the store keyed by canonical absolute path; git does
//! the filesystem work. State is recorded before and after each git call
//! (never across an await while holding the state lock), and failures
//! clean up best-effort so a crashed create leaves no registry entry.

mod git;
mod names;

pub use names::{branch_name, relative_path, safe, slug, WORKTREES_DIR};

use crate::engine::Engine;
use crate::error::WorktreeError;
use el_core::{Clock, ElementId, Event, WorktreeRecord, WorktreeState};
use git::{git_best_effort, git_ok, run_git};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

/// Worktree manager configuration, shared through the engine.
pub struct WorktreeConfig {
    pub repo_root: PathBuf,
    default_branch: Mutex<Option<String>>,
}

impl WorktreeConfig {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self { repo_root: repo_root.into(), default_branch: Mutex::new(None) }
    }
}

/// Canonicalize for comparison; macOS tmp lives behind a symlink, so raw
/// string equality on paths lies.
fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

impl<C: Clock> Engine<C> {
    /// Verify the git repo, ensure the worktree directory and its
    /// `.gitignore` entry, prune stale registrations, and detect the
    /// default branch. Idempotent.
    pub async fn init_workspace(&self) -> Result<String, WorktreeError> {
        let repo = self.worktree_config().repo_root.clone();
        if !repo.join(".git").exists() {
            return Err(WorktreeError::NoRepository(repo.display().to_string()));
        }
        run_git(&repo, &["rev-parse", "--git-dir"]).await.map_err(|_| {
            WorktreeError::NoRepository(repo.display().to_string())
        })?;

        tokio::fs::create_dir_all(repo.join(WORKTREES_DIR)).await?;
        ensure_gitignore(&repo).await?;
        git_best_effort(&repo, &["worktree", "prune"]).await;

        let default = detect_default_branch(&repo).await;
        *self.worktree_config().default_branch.lock() = Some(default.clone());

        // Register the main worktree so removal can refuse it.
        let head = run_git(&repo, &["rev-parse", "HEAD"]).await.ok();
        let main_path = canonical(&repo);
        let now = self.clock().now_utc();
        {
            let mut state = self.state().lock();
            if !state.worktrees.contains_key(&main_path.display().to_string()) {
                let record = WorktreeRecord {
                    path: main_path.clone(),
                    relative_path: PathBuf::new(),
                    branch: Some(default.clone()),
                    head,
                    is_main: true,
                    state: WorktreeState::Active,
                    agent_name: None,
                    task_id: None,
                    created_at: now,
                };
                self.commit_locked(&mut state, Event::WorktreeCreated { record })?;
            }
        }

        Ok(default)
    }

    /// Create an isolated worktree for `(agent, task)` on its own branch.
    pub async fn create_worktree(
        &self,
        agent_name: &str,
        task_id: &ElementId,
        title: Option<&str>,
    ) -> Result<WorktreeRecord, WorktreeError> {
        let repo = self.worktree_config().repo_root.clone();
        let relative = PathBuf::from(relative_path(agent_name, title));
        let path = repo.join(&relative);
        let branch = branch_name(agent_name, task_id.as_str(), title);
        let base = self.default_branch_or_detect(&repo).await;

        let record = self
            .register_creating(&path, &relative, Some(branch.clone()), agent_name, Some(*task_id))
            .await?;

        let result = async {
            let path_str = path.display().to_string();
            let branch_exists =
                git_ok(&repo, &["rev-parse", "--verify", &format!("refs/heads/{branch}")]).await;
            if branch_exists {
                run_git(&repo, &["worktree", "add", &path_str, &branch]).await?;
            } else {
                run_git(&repo, &["worktree", "add", "-b", &branch, &path_str, &base]).await?;
                // Remote may be absent; upstream is a convenience only.
                git_best_effort(
                    &repo,
                    &["branch", &format!("--set-upstream-to=origin/{base}"), &branch],
                )
                .await;
            }
            run_git(&path, &["rev-parse", "HEAD"]).await
        }
        .await;

        match result {
            Ok(head) => self.activate_worktree(record, Some(head)).await,
            Err(e) => {
                self.scrap_failed_create(&repo, &path).await;
                Err(e)
            }
        }
    }

    /// Detached checkout for non-mutating triage sessions; no branch.
    pub async fn create_read_only_worktree(
        &self,
        agent_name: &str,
        title: Option<&str>,
    ) -> Result<WorktreeRecord, WorktreeError> {
        let repo = self.worktree_config().repo_root.clone();
        let relative = PathBuf::from(relative_path(agent_name, title));
        let path = repo.join(&relative);
        let base = self.default_branch_or_detect(&repo).await;

        let record = self.register_creating(&path, &relative, None, agent_name, None).await?;

        let result = async {
            let path_str = path.display().to_string();
            run_git(&repo, &["worktree", "add", "--detach", &path_str, &base]).await?;
            run_git(&path, &["rev-parse", "HEAD"]).await
        }
        .await;

        match result {
            Ok(head) => self.activate_worktree(record, Some(head)).await,
            Err(e) => {
                self.scrap_failed_create(&repo, &path).await;
                Err(e)
            }
        }
    }

    /// Remove a managed worktree. Refuses the main worktree; `force`
    /// passes through to git for dirty trees.
    pub async fn remove_worktree(
        &self,
        path: &Path,
        force: bool,
        delete_branch: Option<bool>,
    ) -> Result<(), WorktreeError> {
        let repo = self.worktree_config().repo_root.clone();
        let key = canonical(path).display().to_string();

        let branch = {
            let mut state = self.state().lock();
            let record = state
                .worktrees
                .get(&key)
                .ok_or_else(|| WorktreeError::UnknownWorktree(key.clone()))?;
            if record.is_main {
                return Err(WorktreeError::MainWorktree);
            }
            record.state.check_transition(WorktreeState::Cleaning)?;
            let mut cleaning = record.clone();
            cleaning.state = WorktreeState::Cleaning;
            let branch = cleaning.branch.clone();
            self.commit_locked(&mut state, Event::WorktreeUpdated { record: cleaning })?;
            branch
        };

        let mut args = vec!["worktree", "remove"];
        if force {
            args.push("--force");
        }
        args.push(&key);
        run_git(&repo, &args).await?;

        if let (Some(force_delete), Some(branch)) = (delete_branch, branch.as_deref()) {
            let flag = if force_delete { "-D" } else { "-d" };
            git_best_effort(&repo, &["branch", flag, branch]).await;
        }

        let mut state = self.state().lock();
        self.commit_locked(&mut state, Event::WorktreeRemoved { path: PathBuf::from(&key) })?;
        Ok(())
    }

    /// Guarded state transition for suspend/resume/merge flows.
    pub fn set_worktree_state(
        &self,
        path: &Path,
        to: WorktreeState,
    ) -> Result<WorktreeRecord, WorktreeError> {
        let key = canonical(path).display().to_string();
        let mut state = self.state().lock();
        let record = state
            .worktrees
            .get(&key)
            .ok_or_else(|| WorktreeError::UnknownWorktree(key.clone()))?;
        record.state.check_transition(to)?;
        let mut next = record.clone();
        next.state = to;
        self.commit_locked(&mut state, Event::WorktreeUpdated { record: next.clone() })?;
        Ok(next)
    }

    pub fn find_worktree(&self, path: &Path) -> Option<WorktreeRecord> {
        let key = canonical(path).display().to_string();
        self.state().lock().worktrees.get(&key).cloned()
    }

    pub fn list_worktrees(&self) -> Vec<WorktreeRecord> {
        let mut records: Vec<WorktreeRecord> =
            self.state().lock().worktrees.values().cloned().collect();
        records.sort_by(|a, b| a.path.cmp(&b.path));
        records
    }

    async fn default_branch_or_detect(&self, repo: &Path) -> String {
        if let Some(cached) = self.worktree_config().default_branch.lock().clone() {
            return cached;
        }
        let detected = detect_default_branch(repo).await;
        *self.worktree_config().default_branch.lock() = Some(detected.clone());
        detected
    }

    /// Claim the path and record the worktree as `creating`.
    async fn register_creating(
        &self,
        path: &Path,
        relative: &Path,
        branch: Option<String>,
        agent_name: &str,
        task_id: Option<ElementId>,
    ) -> Result<WorktreeRecord, WorktreeError> {
        if tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(WorktreeError::PathInUse(path.display().to_string()));
        }
        let now = self.clock().now_utc();
        let record = WorktreeRecord {
            path: path.to_path_buf(),
            relative_path: relative.to_path_buf(),
            branch,
            head: None,
            is_main: false,
            state: WorktreeState::Creating,
            agent_name: Some(agent_name.to_string()),
            task_id,
            created_at: now,
        };

        let mut state = self.state().lock();
        let key = record.path.display().to_string();
        if state.worktrees.contains_key(&key) {
            return Err(WorktreeError::PathInUse(key));
        }
        self.commit_locked(&mut state, Event::WorktreeCreated { record: record.clone() })?;
        Ok(record)
    }

    /// Re-key under the canonical path and mark active.
    async fn activate_worktree(
        &self,
        record: WorktreeRecord,
        head: Option<String>,
    ) -> Result<WorktreeRecord, WorktreeError> {
        let canon = canonical(&record.path);
        let mut state = self.state().lock();
        if canon != record.path {
            self.commit_locked(
                &mut state,
                Event::WorktreeRemoved { path: record.path.clone() },
            )?;
        }
        let mut active = record;
        active.path = canon;
        active.head = head;
        active.state = WorktreeState::Active;
        self.commit_locked(&mut state, Event::WorktreeUpdated { record: active.clone() })?;
        Ok(active)
    }

    /// Best-effort teardown after a failed create; the registry entry and
    /// any partial checkout are both dropped.
    async fn scrap_failed_create(&self, repo: &Path, path: &Path) {
        git_best_effort(repo, &["worktree", "remove", "--force", &path.display().to_string()])
            .await;
        let _ = tokio::fs::remove_dir_all(path).await;
        git_best_effort(repo, &["worktree", "prune"]).await;

        let mut state = self.state().lock();
        let _ = self
            .commit_locked(&mut state, Event::WorktreeRemoved { path: path.to_path_buf() });
    }
}

/// Ensure the worktree directory is ignored.
async fn ensure_gitignore(repo: &Path) -> Result<(), WorktreeError> {
    let gitignore = repo.join(".gitignore");
    let current = tokio::fs::read_to_string(&gitignore).await.unwrap_or_default();
    let covered = current
        .lines()
        .map(str::trim)
        .any(|l| l == ".elemental/" || l == ".elemental" || l == format!("{WORKTREES_DIR}/"));
    if !covered {
        let mut next = current;
        if !next.is_empty() && !next.ends_with('\n') {
            next.push('\n');
        }
        next.push_str(&format!("{WORKTREES_DIR}/\n"));
        tokio::fs::write(&gitignore, next).await?;
    }
    Ok(())
}

/// Prefer `origin/HEAD`, then well-known names, then the current branch.
async fn detect_default_branch(repo: &Path) -> String {
    if let Ok(symref) =
        run_git(repo, &["symbolic-ref", "refs/remotes/origin/HEAD", "--short"]).await
    {
        if let Some(branch) = symref.strip_prefix("origin/") {
            return branch.to_string();
        }
    }
    for candidate in ["main", "master", "develop"] {
        if git_ok(repo, &["rev-parse", "--verify", &format!("refs/heads/{candidate}")]).await {
            return candidate.to_string();
        }
    }
    run_git(repo, &["rev-parse", "--abbrev-ref", "HEAD"])
        .await
        .unwrap_or_else(|_| "main".to_string())
}

#[cfg(test)]
#[path = "worktree_tests.rs"]
mod tests;
