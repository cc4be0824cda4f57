// SPDX-License-Identifier: MIT

//! Persisted message records derived from session events.
//!
//! Every non-`system`/`result` event becomes one record. Structured
//! content arrays are flattened here so consumers never touch raw child
//! JSON: text blocks concatenate into `content`, `tool_use` blocks fill
//! `tool_name`/`tool_input`, `tool_result` blocks fill `tool_output`.

use crate::element::ElementId;
use crate::session::{AgentEvent, AgentEventKind, SessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message kind mirrors the event kind after block-level overrides.
pub type MessageKind = AgentEventKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    /// Stable id shared with the live stream (`msgId`) for client dedup.
    pub id: String,
    pub session_id: SessionId,
    pub agent_id: ElementId,
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    /// Serialized JSON of the tool input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_input: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_output: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl MessageRecord {
    /// Derive the persisted record for an event, or `None` for kinds that
    /// are not persisted (`system`, `result`).
    pub fn from_agent_event(
        session_id: SessionId,
        agent_id: ElementId,
        event: &AgentEvent,
    ) -> Option<MessageRecord> {
        if matches!(event.kind, AgentEventKind::System | AgentEventKind::Result) {
            return None;
        }

        let mut record = MessageRecord {
            id: event.msg_id.clone(),
            session_id,
            agent_id,
            kind: event.kind,
            content: None,
            tool_name: None,
            tool_input: None,
            tool_output: None,
            timestamp: event.timestamp,
        };

        if let Some(tool) = &event.tool {
            record.tool_name = Some(tool.name.clone());
            record.tool_input = Some(serialize_input(&tool.input));
        }

        match &event.message {
            Some(Value::String(s)) => record.content = Some(s.clone()),
            Some(value) => flatten_blocks(value, &mut record),
            None => {}
        }

        // Tool results carry their payload in tool_output only.
        if record.kind == AgentEventKind::ToolResult {
            record.content = None;
        }

        Some(record)
    }
}

/// Flatten a structured message (`{content: [...]}` or a bare block array).
fn flatten_blocks(value: &Value, record: &mut MessageRecord) {
    let blocks = match value {
        Value::Array(items) => items.as_slice(),
        Value::Object(obj) => match obj.get("content") {
            Some(Value::Array(items)) => items.as_slice(),
            Some(Value::String(s)) => {
                record.content = Some(s.clone());
                return;
            }
            _ => return,
        },
        _ => return,
    };

    let mut text = String::new();
    for block in blocks {
        match block.get("type").and_then(Value::as_str) {
            Some("text") => {
                if let Some(t) = block.get("text").and_then(Value::as_str) {
                    text.push_str(t);
                }
            }
            Some("tool_use") => {
                record.tool_name =
                    block.get("name").and_then(Value::as_str).map(str::to_string);
                if let Some(input) = block.get("input") {
                    record.tool_input = Some(serialize_input(input));
                }
                if record.kind == AgentEventKind::Assistant {
                    record.kind = AgentEventKind::ToolUse;
                }
            }
            Some("tool_result") => {
                record.tool_output = Some(block_output_text(block));
                if record.kind == AgentEventKind::User {
                    record.kind = AgentEventKind::ToolResult;
                }
            }
            _ => {}
        }
    }

    if !text.is_empty() {
        record.content = Some(text);
    }
}

/// Textual form of a tool_result block's content.
fn block_output_text(block: &Value) -> String {
    match block.get("content") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|b| b.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join(""),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn serialize_input(input: &Value) -> String {
    serde_json::to_string(input).unwrap_or_else(|_| input.to_string())
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
