// SPDX-License-Identifier: MIT

//! Daemon configuration: `<root>/.elemental/config.toml` with env
//! overrides applied on top.

use crate::env;
use crate::session::{AgentCommand, SessionSettings};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { bind: "127.0.0.1".to_string(), port: 7420 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AgentConfig {
    pub program: String,
    pub headless_args: Vec<String>,
    pub interactive_args: Vec<String>,
    pub resume_flag: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        let agent = AgentCommand::default();
        Self {
            program: agent.program,
            headless_args: agent.headless_args,
            interactive_args: agent.interactive_args,
            resume_flag: agent.resume_flag,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub http: HttpConfig,
    pub agent: AgentConfig,
    /// Seconds between timer-gate re-checks.
    pub timer_tick_ms: u64,
    pub heartbeat_secs: u64,
    pub graceful_stop_timeout_ms: u64,
    /// Per-subscriber event queue capacity.
    pub subscriber_queue: usize,
    /// Snapshot once the WAL backlog passes this count.
    pub snapshot_threshold: u64,
    /// Default GC horizon for ephemeral workflows.
    pub gc_max_age_ms: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            agent: AgentConfig::default(),
            timer_tick_ms: 1_000,
            heartbeat_secs: 30,
            graceful_stop_timeout_ms: 8_000,
            subscriber_queue: 256,
            snapshot_threshold: 4_096,
            gc_max_age_ms: 24 * 60 * 60 * 1000,
        }
    }
}

impl Config {
    /// Load from the state dir, fall back to defaults, apply env
    /// overrides.
    pub fn load(state_dir: &Path) -> Result<Self, ConfigError> {
        let path = state_dir.join("config.toml");
        let mut config = if path.exists() {
            toml::from_str(&std::fs::read_to_string(&path)?)?
        } else {
            Config::default()
        };
        if let Some(port) = env::http_port() {
            config.http.port = port;
        }
        if let Some(tick) = env::timer_tick() {
            config.timer_tick_ms = tick.as_millis() as u64;
        }
        if let Some(stop) = env::stop_timeout() {
            config.graceful_stop_timeout_ms = stop.as_millis() as u64;
        }
        Ok(config)
    }

    /// Write the default config if none exists (workspace init).
    pub fn write_default(state_dir: &Path) -> Result<(), ConfigError> {
        let path = state_dir.join("config.toml");
        if path.exists() {
            return Ok(());
        }
        std::fs::create_dir_all(state_dir)?;
        let rendered = toml::to_string_pretty(&Config::default())
            .unwrap_or_default();
        std::fs::write(path, rendered)?;
        Ok(())
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            agent: AgentCommand {
                program: self.agent.program.clone(),
                headless_args: self.agent.headless_args.clone(),
                interactive_args: self.agent.interactive_args.clone(),
                resume_flag: self.agent.resume_flag.clone(),
            },
            graceful_stop_timeout: Duration::from_millis(self.graceful_stop_timeout_ms),
            queue_capacity: self.subscriber_queue,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
