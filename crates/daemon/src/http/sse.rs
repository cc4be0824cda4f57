// SPDX-License-Identifier: MIT

//! SSE framing for `/api/agents/{id}/stream`.
//!
//! Frame order per subscriber: `connected`, then `agent_user` with the
//! cached initial prompt (every subscribe, for late joiners), then live
//! events in producer order ending with `agent_exit`. Heartbeats
//! interleave so clients can detect dead connections; `overflow` marks
//! queue loss. Dropping the HTTP connection drops the subscription and
//! its queue immediately.

use super::error::ApiError;
use super::AppState;
use axum::extract::{Path, State};
use axum::response::sse::{Event, Sse};
use chrono::Utc;
use el_core::{AgentEvent, SessionEvent};
use futures_util::stream::Stream;
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;

struct StreamState {
    sub: crate::session::StreamSubscription,
    heartbeat: tokio::time::Interval,
    sent_connected: bool,
    pending_prompt: Option<String>,
    prompt_emitted: bool,
    done: bool,
}

pub(super) async fn stream(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let sub = state.sessions.subscribe(&id)?;
    let mut heartbeat =
        tokio::time::interval(Duration::from_secs(state.config.heartbeat_secs.max(1)));
    // First tick fires immediately; consume it so heartbeats are spaced.
    heartbeat.tick().await;

    let stream_state = StreamState {
        pending_prompt: sub.initial_prompt.clone(),
        sub,
        heartbeat,
        sent_connected: false,
        prompt_emitted: false,
        done: false,
    };

    let stream = futures_util::stream::unfold(stream_state, |mut s| async move {
        if s.done {
            return None;
        }

        if !s.sent_connected {
            s.sent_connected = true;
            let data = json!({
                "sessionId": s.sub.session_id,
                "agentId": s.sub.agent_id,
                "timestamp": Utc::now(),
                "msgId": format!("connected-{}", s.sub.session_id),
            });
            let event = Event::default()
                .id(format!("connected-{}", s.sub.session_id))
                .event("connected")
                .data(data.to_string());
            return Some((Ok(event), s));
        }

        if !s.prompt_emitted {
            s.prompt_emitted = true;
            if let Some(prompt) = s.pending_prompt.take() {
                let msg_id = crate::session::initial_prompt_msg_id(&s.sub.session_id);
                let data = json!({
                    "type": "user",
                    "message": prompt,
                    "msgId": msg_id,
                    "timestamp": Utc::now(),
                });
                let event = Event::default()
                    .id(msg_id)
                    .event("agent_user")
                    .data(data.to_string());
                return Some((Ok(event), s));
            }
        }

        loop {
            tokio::select! {
                _ = s.heartbeat.tick() => {
                    let data = json!({
                        "timestamp": Utc::now(),
                        "msgId": format!("heartbeat-{}", s.sub.session_id),
                    });
                    let event = Event::default().event("heartbeat").data(data.to_string());
                    return Some((Ok(event), s));
                }
                received = s.sub.receiver.recv() => {
                    match received {
                        Some(SessionEvent::Agent(agent_event)) => {
                            let event = frame_agent_event(&agent_event);
                            return Some((Ok(event), s));
                        }
                        Some(SessionEvent::Overflow { dropped }) => {
                            let data = json!({
                                "dropped": dropped,
                                "msgId": format!("overflow-{}", s.sub.session_id),
                            });
                            let event =
                                Event::default().event("overflow").data(data.to_string());
                            return Some((Ok(event), s));
                        }
                        Some(SessionEvent::Exit { code, signal }) => {
                            s.done = true;
                            let data = json!({
                                "code": code,
                                "signal": signal,
                                "msgId": format!("exit-{}", s.sub.session_id),
                            });
                            let event = Event::default()
                                .id(format!("exit-{}", s.sub.session_id))
                                .event("agent_exit")
                                .data(data.to_string());
                            return Some((Ok(event), s));
                        }
                        None => {
                            s.done = true;
                            return None;
                        }
                    }
                }
            }
        }
    });

    Ok(Sse::new(stream))
}

/// `agent_<type>` frame carrying the typed event (raw JSON included for
/// passthrough clients).
fn frame_agent_event(event: &AgentEvent) -> Event {
    let name = match event.kind {
        el_core::AgentEventKind::Error => "agent_error".to_string(),
        kind => format!("agent_{kind}"),
    };
    let data = serde_json::to_string(event).unwrap_or_else(|_| {
        json!({ "msgId": event.msg_id, "type": event.kind.as_str() }).to_string()
    });
    Event::default().id(event.msg_id.clone()).event(name).data(data)
}
