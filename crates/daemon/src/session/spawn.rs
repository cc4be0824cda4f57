// SPDX-License-Identifier: MIT

//! Child process command construction.

use el_core::{SessionMode, SessionRecord};
use std::process::Stdio;
use tokio::process::Command;

/// How agent children are launched; comes from daemon config.
#[derive(Debug, Clone)]
pub struct AgentCommand {
    pub program: String,
    /// Args for `-p`-style one-shot runs emitting stream JSON.
    pub headless_args: Vec<String>,
    /// Args for long-lived interactive runs driven over stdin.
    pub interactive_args: Vec<String>,
    pub resume_flag: String,
}

impl Default for AgentCommand {
    fn default() -> Self {
        Self {
            program: "claude".to_string(),
            headless_args: vec![
                "-p".to_string(),
                "--output-format".to_string(),
                "stream-json".to_string(),
                "--verbose".to_string(),
            ],
            interactive_args: vec![
                "--output-format".to_string(),
                "stream-json".to_string(),
                "--input-format".to_string(),
                "stream-json".to_string(),
            ],
            resume_flag: "--resume".to_string(),
        }
    }
}

/// Build the child command for a session.
///
/// Headless runs get the prompt as a trailing argument; interactive runs
/// receive it over stdin after start. Resume prepends the resume flag
/// with the prior session's cookie.
pub(crate) fn build_command(
    agent: &AgentCommand,
    record: &SessionRecord,
    resume_cookie: Option<&str>,
) -> Command {
    let mut cmd = Command::new(&agent.program);
    match record.mode {
        SessionMode::Headless => cmd.args(&agent.headless_args),
        SessionMode::Interactive => cmd.args(&agent.interactive_args),
    };
    if let Some(cookie) = resume_cookie {
        cmd.arg(&agent.resume_flag).arg(cookie);
    }
    if record.mode == SessionMode::Headless {
        if let Some(prompt) = &record.initial_prompt {
            cmd.arg(prompt);
        }
    }
    cmd.current_dir(&record.working_directory)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    cmd
}
