// SPDX-License-Identifier: MIT

use super::*;
use el_core::AgentEventKind;

fn parser() -> LineParser {
    LineParser::new(SessionId::from_string("ses-test"))
}

fn now() -> DateTime<Utc> {
    Utc::now()
}

#[test]
fn empty_lines_yield_nothing() {
    let mut p = parser();
    assert!(p.parse("", now()).is_none());
    assert!(p.parse("   ", now()).is_none());
}

#[yare::parameterized(
    system = { "system", AgentEventKind::System },
    assistant = { "assistant", AgentEventKind::Assistant },
    user = { "user", AgentEventKind::User },
    tool_use = { "tool_use", AgentEventKind::ToolUse },
    tool_result = { "tool_result", AgentEventKind::ToolResult },
    result = { "result", AgentEventKind::Result },
    error = { "error", AgentEventKind::Error },
)]
fn type_tags_map_to_kinds(tag: &str, kind: AgentEventKind) {
    let mut p = parser();
    let line = format!(r#"{{"type": "{tag}"}}"#);
    let parsed = p.parse(&line, now()).unwrap();
    assert_eq!(parsed.event.kind, kind);
}

#[test]
fn unknown_type_degrades_to_system() {
    let mut p = parser();
    let parsed = p.parse(r#"{"type": "telemetry"}"#, now()).unwrap();
    assert_eq!(parsed.event.kind, AgentEventKind::System);
}

#[test]
fn non_json_degrades_to_system_with_text() {
    let mut p = parser();
    let parsed = p.parse("plain chatter", now()).unwrap();
    assert_eq!(parsed.event.kind, AgentEventKind::System);
    assert_eq!(
        parsed.event.message,
        Some(serde_json::Value::String("plain chatter".to_string()))
    );
    assert!(parsed.cookie.is_none());
}

#[test]
fn msg_ids_are_sequential_and_scoped() {
    let mut p = parser();
    let first = p.parse(r#"{"type": "assistant"}"#, now()).unwrap();
    let second = p.parse(r#"{"type": "assistant"}"#, now()).unwrap();
    assert_eq!(first.event.msg_id, "assistant-ses-test-1");
    assert_eq!(second.event.msg_id, "assistant-ses-test-2");
}

#[test]
fn message_and_raw_are_retained() {
    let mut p = parser();
    let line = r#"{"type": "assistant", "message": {"content": [{"type": "text", "text": "hi"}]}}"#;
    let parsed = p.parse(line, now()).unwrap();
    assert!(parsed.event.message.is_some());
    let raw = parsed.event.raw.unwrap();
    assert_eq!(raw["type"], serde_json::json!("assistant"));
}

#[test]
fn cookie_is_sniffed_from_session_id() {
    let mut p = parser();
    let parsed = p
        .parse(r#"{"type": "system", "session_id": "abc-123"}"#, now())
        .unwrap();
    assert_eq!(parsed.cookie.as_deref(), Some("abc-123"));

    let parsed = p.parse(r#"{"type": "system", "sessionId": "camel"}"#, now()).unwrap();
    assert_eq!(parsed.cookie.as_deref(), Some("camel"));
}

#[test]
fn explicit_tool_field_is_parsed() {
    let mut p = parser();
    let line = r#"{"type": "tool_use", "tool": {"name": "bash", "input": {"command": "ls"}}}"#;
    let parsed = p.parse(line, now()).unwrap();
    let tool = parsed.event.tool.unwrap();
    assert_eq!(tool.name, "bash");
    assert_eq!(tool.input["command"], serde_json::json!("ls"));
}

#[test]
fn error_field_becomes_message_for_error_events() {
    let mut p = parser();
    let parsed = p.parse(r#"{"type": "error", "error": "boom"}"#, now()).unwrap();
    assert_eq!(parsed.event.message, Some(serde_json::Value::String("boom".to_string())));
}

#[test]
fn result_field_becomes_message_for_result_events() {
    let mut p = parser();
    let parsed = p.parse(r#"{"type": "result", "result": "done"}"#, now()).unwrap();
    assert_eq!(parsed.event.message, Some(serde_json::Value::String("done".to_string())));
}

#[test]
fn initial_prompt_id_shape() {
    assert_eq!(
        initial_prompt_msg_id(&SessionId::from_string("ses-abc")),
        "user-ses-abc-initial"
    );
}
