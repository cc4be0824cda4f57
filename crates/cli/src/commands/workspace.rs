// SPDX-License-Identifier: MIT

//! `el init` and `el reset`: workspace plumbing that runs without the
//! daemon.

use crate::exit_error::ExitError;
use el_daemon::config::Config;
use el_daemon::lifecycle::DaemonLock;
use el_engine::{Engine, WorktreeConfig};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::path::{Path, PathBuf};
use std::time::Duration;

fn workspace_root() -> PathBuf {
    std::env::var("ELEMENTAL_ROOT")
        .map(PathBuf::from)
        .or_else(|_| std::env::current_dir())
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Create `.elemental/`, write the default config, verify git, seed the
/// system entity. Idempotent.
pub async fn init() -> Result<(), ExitError> {
    let root = workspace_root();
    let state_dir = root.join(".elemental");
    for dir in [state_dir.clone(), state_dir.join("uploads")] {
        std::fs::create_dir_all(&dir)
            .map_err(|e| ExitError::general(format!("cannot create {}: {e}", dir.display())))?;
    }
    Config::write_default(&state_dir)
        .map_err(|e| ExitError::general(format!("config write failed: {e}")))?;

    // Opening the store directly must not race a live daemon.
    let _lock = DaemonLock::acquire(&state_dir)
        .map_err(|_| ExitError::new(5, "daemon is running; stop it before init"))?;

    let engine = Engine::open(&state_dir.join("store"), WorktreeConfig::new(root.clone()))
        .map_err(|e| ExitError::general(format!("store open failed: {e}")))?;
    engine
        .ensure_system_entity()
        .map_err(|e| ExitError::general(format!("bootstrap failed: {e}")))?;

    match engine.init_workspace().await {
        Ok(default_branch) => {
            println!("initialized {} (default branch {default_branch})", root.display());
        }
        Err(e) => {
            // Usable without git; worktree features stay off until a repo
            // exists.
            println!("initialized {} (no usable git repo: {e})", root.display());
        }
    }
    engine
        .snapshot_now()
        .map_err(|e| ExitError::general(format!("snapshot failed: {e}")))?;
    Ok(())
}

/// Stop the daemon and remove workspace state. Config survives unless
/// `--full`.
pub async fn reset(full: bool) -> Result<(), ExitError> {
    let root = workspace_root();
    let state_dir = root.join(".elemental");
    if !state_dir.exists() {
        println!("nothing to reset at {}", root.display());
        return Ok(());
    }

    stop_daemon(&state_dir).await;

    let config_path = state_dir.join("config.toml");
    let keep_config = !full && config_path.exists();
    let saved = if keep_config { std::fs::read(&config_path).ok() } else { None };

    std::fs::remove_dir_all(&state_dir)
        .map_err(|e| ExitError::general(format!("cannot remove {}: {e}", state_dir.display())))?;

    if let Some(contents) = saved {
        std::fs::create_dir_all(&state_dir)
            .and_then(|_| std::fs::write(&config_path, contents))
            .map_err(|e| ExitError::general(format!("config restore failed: {e}")))?;
    }

    println!("reset {}", root.display());
    Ok(())
}

/// SIGTERM the daemon named in the pid file and wait for it to go away.
async fn stop_daemon(state_dir: &Path) {
    let pid_path = state_dir.join("eld.pid");
    let Some(pid) = std::fs::read_to_string(&pid_path)
        .ok()
        .and_then(|s| s.trim().parse::<i32>().ok())
    else {
        return;
    };

    if kill(Pid::from_raw(pid), Signal::SIGTERM).is_err() {
        return; // already gone
    }
    for _ in 0..50 {
        if kill(Pid::from_raw(pid), None).is_err() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    let _ = kill(Pid::from_raw(pid), Signal::SIGKILL);
}
