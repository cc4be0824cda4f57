// SPDX-License-Identifier: MIT

//! Boundary parser for child stdout.
//!
//! Each line is expected to be one JSON object in the agent's stream
//! format. The parser tags it into a typed [`AgentEvent`] and sniffs the
//! resumption cookie as a side effect; raw JSON rides along for stream
//! passthrough. Non-JSON lines degrade to `system` events rather than
//! being dropped.

use chrono::{DateTime, Utc};
use el_core::{AgentEvent, AgentEventKind, SessionId, ToolCall};
use serde_json::Value;

pub struct ParsedLine {
    pub event: AgentEvent,
    /// Resumption cookie, when the line carries one.
    pub cookie: Option<String>,
}

pub struct LineParser {
    session_id: SessionId,
    seq: u64,
}

impl LineParser {
    pub fn new(session_id: SessionId) -> Self {
        Self { session_id, seq: 0 }
    }

    /// Parse one stdout line. Empty lines yield nothing.
    pub fn parse(&mut self, line: &str, now: DateTime<Utc>) -> Option<ParsedLine> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }

        let Ok(raw) = serde_json::from_str::<Value>(trimmed) else {
            // Not part of the protocol; surface as system chatter.
            return Some(ParsedLine {
                event: self.event(AgentEventKind::System, None, Some(Value::String(line.to_string())), None, now),
                cookie: None,
            });
        };

        let kind = raw
            .get("type")
            .and_then(Value::as_str)
            .and_then(parse_kind)
            .unwrap_or(AgentEventKind::System);

        let message = raw
            .get("message")
            .or_else(|| raw.get("content"))
            .or_else(|| raw.get("error").filter(|_| kind == AgentEventKind::Error))
            .or_else(|| raw.get("result").filter(|_| kind == AgentEventKind::Result))
            .cloned();

        let tool = raw.get("tool").and_then(|t| {
            Some(ToolCall {
                name: t.get("name")?.as_str()?.to_string(),
                input: t.get("input").cloned().unwrap_or(Value::Null),
            })
        });

        let cookie = raw
            .get("session_id")
            .or_else(|| raw.get("sessionId"))
            .and_then(Value::as_str)
            .map(str::to_string);

        Some(ParsedLine {
            event: self.event(kind, tool, message, Some(raw), now),
            cookie,
        })
    }

    fn event(
        &mut self,
        kind: AgentEventKind,
        tool: Option<ToolCall>,
        message: Option<Value>,
        raw: Option<Value>,
        now: DateTime<Utc>,
    ) -> AgentEvent {
        self.seq += 1;
        AgentEvent {
            kind,
            msg_id: format!("{kind}-{}-{}", self.session_id, self.seq),
            tool,
            message,
            raw,
            timestamp: now,
        }
    }
}

fn parse_kind(s: &str) -> Option<AgentEventKind> {
    Some(match s {
        "system" => AgentEventKind::System,
        "assistant" => AgentEventKind::Assistant,
        "user" => AgentEventKind::User,
        "tool_use" => AgentEventKind::ToolUse,
        "tool_result" => AgentEventKind::ToolResult,
        "result" => AgentEventKind::Result,
        "error" => AgentEventKind::Error,
        _ => return None,
    })
}

/// Message id of the synthetic initial prompt event for a session.
pub fn initial_prompt_msg_id(session_id: &SessionId) -> String {
    format!("user-{session_id}-initial")
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
