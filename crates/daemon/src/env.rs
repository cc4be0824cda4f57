// SPDX-License-Identifier: MIT

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

/// Workspace root: `ELEMENTAL_ROOT` or the current directory.
pub fn workspace_root() -> PathBuf {
    std::env::var("ELEMENTAL_ROOT")
        .map(PathBuf::from)
        .or_else(|_| std::env::current_dir())
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// The per-workspace state directory.
pub fn state_dir(root: &std::path::Path) -> PathBuf {
    root.join(".elemental")
}

/// HTTP port override.
pub fn http_port() -> Option<u16> {
    std::env::var("ELEMENTAL_HTTP_PORT").ok().and_then(|s| s.parse().ok())
}

/// Timer-gate tick interval override.
pub fn timer_tick() -> Option<Duration> {
    std::env::var("ELEMENTAL_TIMER_TICK_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Graceful stop timeout override.
pub fn stop_timeout() -> Option<Duration> {
    std::env::var("ELEMENTAL_STOP_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Log filter (`ELEMENTAL_LOG`), defaulting to `info`.
pub fn log_filter() -> String {
    std::env::var("ELEMENTAL_LOG").unwrap_or_else(|_| "info".to_string())
}
