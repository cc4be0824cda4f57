// SPDX-License-Identifier: MIT

//! Git subprocess helpers.

use crate::error::WorktreeError;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;

/// Worktree operations involve disk I/O only; a hung git here means a
/// wedged repo, not a slow network.
const GIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Run git in `repo`, returning trimmed stdout on success.
pub(crate) async fn run_git(repo: &Path, args: &[&str]) -> Result<String, WorktreeError> {
    let mut cmd = Command::new("git");
    cmd.arg("-C")
        .arg(repo)
        .args(args)
        .env_remove("GIT_DIR")
        .env_remove("GIT_WORK_TREE");

    let command = format!("git {}", args.join(" "));
    let output = tokio::time::timeout(GIT_TIMEOUT, cmd.output())
        .await
        .map_err(|_| WorktreeError::Git {
            command: command.clone(),
            stderr: format!("timed out after {}s", GIT_TIMEOUT.as_secs()),
        })??;

    if !output.status.success() {
        return Err(WorktreeError::Git {
            command,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Run git, discarding the outcome. For best-effort cleanup paths.
pub(crate) async fn git_best_effort(repo: &Path, args: &[&str]) {
    let _ = run_git(repo, args).await;
}

/// Whether a git invocation succeeds (ref probes and the like).
pub(crate) async fn git_ok(repo: &Path, args: &[&str]) -> bool {
    run_git(repo, args).await.is_ok()
}
