// SPDX-License-Identifier: MIT

//! Agent session records and the typed session event model.
//!
//! A session is one child process bound to an agent entity. The child's
//! stdout is parsed at the boundary into [`AgentEvent`] values (a tagged
//! union, never raw JSON downstream); subscribers receive [`SessionEvent`]s
//! which add the terminal exit marker and the overflow loss marker.

use crate::element::ElementId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;

crate::define_id! {
    /// Unique identifier for an agent session.
    pub struct SessionId("ses-");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    Headless,
    Interactive,
}

crate::simple_display! {
    SessionMode {
        Headless => "headless",
        Interactive => "interactive",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Starting,
    Running,
    Suspended,
    Terminating,
    Terminated,
}

impl SessionStatus {
    /// A live session holds the per-agent uniqueness slot.
    pub fn is_live(self) -> bool {
        matches!(
            self,
            SessionStatus::Starting | SessionStatus::Running | SessionStatus::Terminating
        )
    }

    /// Allowed successors:
    ///
    /// ```text
    /// starting → running → {suspended, terminating} → terminated
    /// starting → terminating → terminated
    /// ```
    pub fn can_transition(self, to: SessionStatus) -> bool {
        use SessionStatus::*;
        match (self, to) {
            (Starting, Running | Terminating) => true,
            (Running, Suspended | Terminating) => true,
            (Suspended, Terminating) => true,
            (Terminating, Terminated) => true,
            _ => false,
        }
    }

    pub fn check_transition(self, to: SessionStatus) -> Result<(), SessionTransitionError> {
        if self.can_transition(to) {
            Ok(())
        } else {
            Err(SessionTransitionError { from: self, to })
        }
    }
}

crate::simple_display! {
    SessionStatus {
        Starting => "starting",
        Running => "running",
        Suspended => "suspended",
        Terminating => "terminating",
        Terminated => "terminated",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid session status transition: {from} -> {to}")]
pub struct SessionTransitionError {
    pub from: SessionStatus,
    pub to: SessionStatus,
}

/// Persisted record of one agent session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: SessionId,
    pub agent_id: ElementId,
    pub mode: SessionMode,
    pub status: SessionStatus,
    /// Resumption cookie written by the child; persisted on first sight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claude_session_id: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminated_at: Option<DateTime<Utc>>,
    pub working_directory: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worktree_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_signal: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_prompt: Option<String>,
}

impl SessionRecord {
    /// A session can seed a resume once it has written a cookie.
    pub fn is_resumable(&self) -> bool {
        self.claude_session_id.is_some()
    }
}

/// Kind of an event produced by the child process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentEventKind {
    System,
    Assistant,
    User,
    ToolUse,
    ToolResult,
    Result,
    Error,
}

crate::simple_display! {
    AgentEventKind {
        System => "system",
        Assistant => "assistant",
        User => "user",
        ToolUse => "tool_use",
        ToolResult => "tool_result",
        Result => "result",
        Error => "error",
    }
}

impl AgentEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentEventKind::System => "system",
            AgentEventKind::Assistant => "assistant",
            AgentEventKind::User => "user",
            AgentEventKind::ToolUse => "tool_use",
            AgentEventKind::ToolResult => "tool_result",
            AgentEventKind::Result => "result",
            AgentEventKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub input: Value,
}

/// One parsed event from a session's child process.
///
/// `raw` retains the original JSON for passthrough to stream clients;
/// downstream logic works with the typed fields only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentEvent {
    #[serde(rename = "type")]
    pub kind: AgentEventKind,
    /// Stable id for client-side dedup against persisted messages.
    pub msg_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<Value>,
    pub timestamp: DateTime<Utc>,
}

/// What a session subscriber receives, in strict producer order.
///
/// Not serialized as-is — the SSE layer frames each case with its own
/// event name and JSON body.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Agent(AgentEvent),
    /// Exactly one per session, delivered last.
    Exit {
        code: Option<i32>,
        signal: Option<i32>,
    },
    /// The subscriber's queue overflowed and `dropped` events were lost.
    Overflow { dropped: u64 },
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
