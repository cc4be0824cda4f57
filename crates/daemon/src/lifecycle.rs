// SPDX-License-Identifier: MIT

//! Daemon lifecycle: tracing setup, the pid lock, and shutdown signals.

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("another daemon holds the lock at {0}")]
    AlreadyRunning(String),
}

/// Advisory lock + pid file; released on drop.
pub struct DaemonLock {
    file: File,
    path: std::path::PathBuf,
}

impl DaemonLock {
    pub fn acquire(state_dir: &Path) -> Result<Self, LifecycleError> {
        std::fs::create_dir_all(state_dir)?;
        let path = state_dir.join("eld.pid");
        let mut file = OpenOptions::new().create(true).write(true).truncate(false).open(&path)?;
        if file.try_lock_exclusive().is_err() {
            return Err(LifecycleError::AlreadyRunning(path.display().to_string()));
        }
        file.set_len(0)?;
        writeln!(file, "{}", std::process::id())?;
        file.sync_all()?;
        Ok(Self { file, path })
    }
}

impl Drop for DaemonLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Install the subscriber: env-filtered stderr plus a daily log file
/// under the state dir. Returns the appender guard; drop it last.
pub fn init_tracing(state_dir: &Path, filter: &str) -> tracing_appender::non_blocking::WorkerGuard {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let appender = tracing_appender::rolling::daily(state_dir.join("logs"), "eld.log");
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_new(filter).unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new("info")
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::fmt::layer().with_writer(file_writer).with_ansi(false))
        .try_init();

    guard
}

/// Resolve on SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    let term = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };
    tokio::select! {
        _ = ctrl_c => info!("interrupt received"),
        _ = term => info!("terminate received"),
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
