// SPDX-License-Identifier: MIT

//! Session query routes.

use super::error::ApiError;
use super::AppState;
use axum::extract::{Path, Query, State};
use axum::Json;
use el_core::{ElementId, SessionStatus};
use el_engine::SessionFilter;
use el_wire::{MessagesResponse, SessionList};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ListQuery {
    agent: Option<String>,
    status: Option<String>,
    limit: Option<usize>,
}

pub(super) async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<SessionList>, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(|s| {
            parse_status(s)
                .ok_or_else(|| ApiError::invalid_input(format!("unknown session status: {s}")))
        })
        .transpose()?;
    let filter = SessionFilter {
        agent_id: query.agent.map(|a| ElementId::from_string(a)),
        status,
        limit: query.limit,
    };
    Ok(Json(SessionList { sessions: state.engine.sessions(&filter) }))
}

pub(super) async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<el_core::SessionRecord>, ApiError> {
    state.engine.session(&id).map(Json).ok_or_else(|| ApiError::not_found(id))
}

#[derive(Debug, Deserialize)]
pub(super) struct MessagesQuery {
    after: Option<String>,
}

pub(super) async fn messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<MessagesResponse>, ApiError> {
    if state.engine.session(&id).is_none() {
        return Err(ApiError::not_found(id));
    }
    let messages = state.engine.session_messages(&id, query.after.as_deref());
    Ok(Json(MessagesResponse { session_id: id, messages }))
}

fn parse_status(s: &str) -> Option<SessionStatus> {
    Some(match s {
        "starting" => SessionStatus::Starting,
        "running" => SessionStatus::Running,
        "suspended" => SessionStatus::Suspended,
        "terminating" => SessionStatus::Terminating,
        "terminated" => SessionStatus::Terminated,
        _ => return None,
    })
}
