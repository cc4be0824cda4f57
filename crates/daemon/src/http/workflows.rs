// SPDX-License-Identifier: MIT

//! Workflow routes.

use super::error::ApiError;
use super::{ApiJson, AppState};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use el_core::{ElementBody, ElementKind, EntityId, WorkflowFields};
use el_engine::{ElementFilter, ElementPatch, NewElement};
use el_wire::{
    CreateWorkflowRequest, GcRequest, GcResponse, PourRequest, PourResponse, ProgressResponse,
    UpdateWorkflowRequest, WorkflowTasksResponse,
};

fn actor_or_system(created_by: Option<String>) -> EntityId {
    created_by
        .map(EntityId::from_string)
        .unwrap_or_else(|| EntityId::from_string(el_core::SYSTEM_ENTITY))
}

pub(super) async fn create(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateWorkflowRequest>,
) -> Result<(StatusCode, Json<el_core::Element>), ApiError> {
    let element = state.engine.create(NewElement::new(
        req.title,
        actor_or_system(req.created_by),
        ElementBody::Workflow(WorkflowFields {
            ephemeral: req.ephemeral.unwrap_or(false),
            ..Default::default()
        }),
    ))?;
    Ok((StatusCode::CREATED, Json(element)))
}

pub(super) async fn list(State(state): State<AppState>) -> Json<Vec<el_core::Element>> {
    Json(state.engine.list(&ElementFilter::kind(ElementKind::Workflow)))
}

pub(super) async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<el_core::Element>, ApiError> {
    let element = state.engine.get(&id, false)?;
    if element.kind() != ElementKind::Workflow {
        return Err(ApiError::not_found(id));
    }
    Ok(Json(element))
}

pub(super) async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateWorkflowRequest>,
) -> Result<Json<el_core::Element>, ApiError> {
    let patch = ElementPatch {
        title: req.title,
        status: req.status,
        failure_reason: req.failure_reason.map(Some),
        cancel_reason: req.cancel_reason.map(Some),
        ..Default::default()
    };
    Ok(Json(state.engine.update(&id, patch, req.expected_version)?))
}

pub(super) async fn pour(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<PourRequest>,
) -> Result<(StatusCode, Json<PourResponse>), ApiError> {
    let outcome = state.engine.pour_workflow(
        &req.playbook,
        req.variables,
        req.ephemeral.unwrap_or(true),
        req.title,
        actor_or_system(req.created_by),
    )?;
    Ok((
        StatusCode::CREATED,
        Json(PourResponse {
            workflow: outcome.workflow,
            task_ids: outcome.task_ids,
            skipped_steps: outcome.skipped_steps,
        }),
    ))
}

pub(super) async fn progress(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProgressResponse>, ApiError> {
    let progress = state.engine.workflow_progress(&id)?;
    Ok(Json(ProgressResponse {
        workflow_id: progress.workflow_id,
        total_tasks: progress.total_tasks,
        status_counts: progress.status_counts,
        ready_tasks: progress.ready_tasks,
        blocked_tasks: progress.blocked_tasks,
        completion_percentage: progress.completion_percentage,
    }))
}

pub(super) async fn tasks(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<WorkflowTasksResponse>, ApiError> {
    let tasks = state.engine.workflow_tasks(&id)?;
    Ok(Json(WorkflowTasksResponse {
        workflow_id: el_core::ElementId::from_string(&id),
        tasks,
    }))
}

pub(super) async fn squash(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<el_core::Element>, ApiError> {
    Ok(Json(state.engine.squash_workflow(&id)?))
}

pub(super) async fn burn(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let purged = state.engine.burn_workflow(&id, false)?;
    Ok(Json(serde_json::json!({ "burned": purged })))
}

pub(super) async fn gc(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<GcRequest>,
) -> Result<Json<GcResponse>, ApiError> {
    let max_age = req.max_age_ms.unwrap_or(state.config.gc_max_age_ms);
    let report = state.engine.gc_workflows(max_age, req.dry_run.unwrap_or(false))?;
    Ok(Json(GcResponse {
        candidates: report.candidates,
        burned: report.burned,
        dry_run: report.dry_run,
    }))
}
