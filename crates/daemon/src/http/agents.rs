// SPDX-License-Identifier: MIT

//! Agent session routes.

use super::error::ApiError;
use super::{ApiJson, AppState};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use crate::session::StartOptions;
use el_wire::{ResumeSessionRequest, SendInputRequest, StartSessionRequest, StopSessionRequest};
use serde_json::json;

pub(super) async fn start(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<StartSessionRequest>,
) -> Result<(StatusCode, Json<el_core::SessionRecord>), ApiError> {
    let record = state
        .sessions
        .start_session(
            &id,
            StartOptions {
                working_directory: req.working_directory,
                worktree: req.worktree,
                initial_prompt: req.initial_prompt,
                interactive: req.interactive.unwrap_or(false),
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub(super) async fn resume(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<ResumeSessionRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let (record, uwp) = state
        .sessions
        .resume_session(
            &id,
            req.claude_session_id,
            StartOptions {
                working_directory: req.working_directory,
                worktree: None,
                initial_prompt: req.initial_prompt,
                interactive: req.interactive.unwrap_or(false),
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "session": record, "uwpCheck": uwp }))))
}

pub(super) async fn stop(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<StopSessionRequest>,
) -> Result<Json<el_core::SessionRecord>, ApiError> {
    let active = state.sessions.get_active_session(&id)?;
    let record = state
        .sessions
        .stop_session(active.id.as_str(), req.graceful.unwrap_or(true), req.reason)
        .await?;
    Ok(Json(record))
}

pub(super) async fn interrupt(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let active = state.sessions.get_active_session(&id)?;
    state.sessions.interrupt_session(active.id.as_str())?;
    Ok(Json(json!({ "interrupted": active.id })))
}

pub(super) async fn input(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<SendInputRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let active = state.sessions.get_active_session(&id)?;
    state
        .sessions
        .send_input(active.id.as_str(), &req.input, req.is_user_message.unwrap_or(false))
        .await?;
    Ok(Json(json!({ "delivered": active.id })))
}
