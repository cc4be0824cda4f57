// SPDX-License-Identifier: MIT

//! Task routes.

use super::error::ApiError;
use super::{ApiJson, AppState};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use el_core::{ElementBody, ElementKind, EntityId, TaskFields, TaskType};
use el_engine::{ElementFilter, ElementPatch, NewElement, TaskFilter};
use el_wire::{
    BlockedTaskEntry, CreateTaskRequest, DispatchRequest, TaskDetail, TaskList, UpdateTaskRequest,
};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ListQuery {
    status: Option<String>,
    assignee: Option<String>,
    #[serde(default)]
    unassigned: bool,
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ReadyQuery {
    assignee: Option<String>,
    priority: Option<u8>,
    #[serde(rename = "type")]
    task_type: Option<String>,
    limit: Option<usize>,
}

fn parse_task_type(s: &str) -> Result<TaskType, ApiError> {
    match s {
        "bug" => Ok(TaskType::Bug),
        "feature" => Ok(TaskType::Feature),
        "task" => Ok(TaskType::Task),
        "chore" => Ok(TaskType::Chore),
        other => Err(ApiError::invalid_input(format!("unknown task type: {other}"))),
    }
}

fn actor_or_system(created_by: Option<String>) -> EntityId {
    created_by
        .map(EntityId::from_string)
        .unwrap_or_else(|| EntityId::from_string(el_core::SYSTEM_ENTITY))
}

pub(super) async fn create(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateTaskRequest>,
) -> Result<(StatusCode, Json<el_core::Element>), ApiError> {
    let mut fields = TaskFields {
        description: req.description,
        assignee: req.assignee.map(EntityId::from_string),
        owner: req.owner.map(EntityId::from_string),
        scheduled_for: req.scheduled_for,
        deadline: req.deadline,
        ephemeral: req.ephemeral.unwrap_or(false),
        ..Default::default()
    };
    if let Some(priority) = req.priority {
        fields.priority = priority;
    }
    if let Some(complexity) = req.complexity {
        fields.complexity = complexity;
    }
    if let Some(task_type) = req.task_type.as_deref() {
        fields.task_type = parse_task_type(task_type)?;
    }

    let mut new = NewElement::new(req.title, actor_or_system(req.created_by), ElementBody::Task(fields));
    if let Some(tags) = req.tags {
        new = new.tags(tags);
    }
    let element = state.engine.create(new)?;
    Ok((StatusCode::CREATED, Json(element)))
}

pub(super) async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<TaskList> {
    let filter = ElementFilter {
        kind: Some(ElementKind::Task),
        status: query.status,
        assignee: query.assignee.map(EntityId::from_string),
        unassigned: query.unassigned,
        limit: query.limit,
        ..Default::default()
    };
    let tasks = state.engine.list(&filter);
    let total = tasks.len();
    Json(TaskList { tasks, total })
}

pub(super) async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TaskDetail>, ApiError> {
    let element = state.engine.get(&id, false)?;
    if element.kind() != ElementKind::Task {
        return Err(ApiError::not_found(id));
    }
    let title_of = |entity: Option<&EntityId>| {
        entity.and_then(|e| state.engine.get(e.as_str(), false).ok()).map(|e| e.title)
    };
    let assignee_title = title_of(element.task().and_then(|t| t.assignee.as_ref()));
    let owner_title = title_of(element.task().and_then(|t| t.owner.as_ref()));
    let blocked_reason = state
        .engine
        .with_state(|s| s.blocked.get(element.id.as_str()).map(|b| b.reason.clone()));
    Ok(Json(TaskDetail { element, assignee_title, owner_title, blocked_reason }))
}

pub(super) async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateTaskRequest>,
) -> Result<Json<el_core::Element>, ApiError> {
    let patch = ElementPatch {
        title: req.title,
        status: req.status,
        priority: req.priority,
        complexity: req.complexity,
        tags: req.tags,
        description: req.description,
        assignee: req.assignee.map(|a| a.map(EntityId::from_string)),
        owner: req.owner.map(|o| o.map(EntityId::from_string)),
        deadline: req.deadline,
        scheduled_for: req.scheduled_for,
        close_reason: req.close_reason.map(Some),
        ..Default::default()
    };
    let element = state.engine.update(&id, patch, req.expected_version)?;
    Ok(Json(element))
}

pub(super) async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.engine.delete(&id)?;
    Ok(Json(json!({ "deleted": id })))
}

pub(super) async fn start(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<el_core::Element>, ApiError> {
    Ok(Json(state.engine.start_task(&id)?))
}

pub(super) async fn complete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<el_core::Element>, ApiError> {
    Ok(Json(state.engine.close_task(&id, None)?))
}

pub(super) async fn ready(
    State(state): State<AppState>,
    Query(query): Query<ReadyQuery>,
) -> Result<Json<TaskList>, ApiError> {
    let filter = ready_filter(query)?;
    let tasks = state.engine.ready_tasks(&filter);
    let total = tasks.len();
    Ok(Json(TaskList { tasks, total }))
}

pub(super) async fn blocked(
    State(state): State<AppState>,
    Query(query): Query<ReadyQuery>,
) -> Result<Json<Vec<BlockedTaskEntry>>, ApiError> {
    let filter = ready_filter(query)?;
    let entries = state
        .engine
        .blocked_tasks(&filter)
        .into_iter()
        .map(|b| BlockedTaskEntry { task: b.task, blocked_by: b.blocked_by, reason: b.reason })
        .collect();
    Ok(Json(entries))
}

fn ready_filter(query: ReadyQuery) -> Result<TaskFilter, ApiError> {
    Ok(TaskFilter {
        assignee: query.assignee.map(EntityId::from_string),
        priority: query.priority,
        task_type: query.task_type.as_deref().map(parse_task_type).transpose()?,
        limit: query.limit,
    })
}

/// Assign an agent and create its worktree for this task.
pub(super) async fn dispatch(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<DispatchRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let agent = state.engine.get(&req.agent, false)?;
    if agent.entity_type() != Some(el_core::EntityType::Agent) {
        return Err(ApiError::new(
            el_wire::ErrorCode::InvalidAgent,
            format!("not an agent entity: {}", req.agent),
        ));
    }
    let task = state.engine.assign_task(&id, Some(agent.id))?;
    let worktree = state
        .engine
        .create_worktree(&agent.title, &task.id, Some(&task.title))
        .await?;
    Ok(Json(json!({ "task": task, "worktree": worktree })))
}

/// Start a headless worker session in the task's worktree.
pub(super) async fn start_worker(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<el_core::SessionRecord>), ApiError> {
    let task = state.engine.get(&id, false)?;
    let fields = task.task().ok_or_else(|| ApiError::not_found(id.clone()))?;
    let assignee = fields
        .assignee
        .ok_or_else(|| ApiError::new(el_wire::ErrorCode::InvalidState, "task is unassigned"))?;

    let worktree = state.engine.with_state(|s| {
        s.worktrees.values().find(|w| w.task_id == Some(task.id)).cloned()
    });
    let worktree = worktree.ok_or_else(|| {
        ApiError::new(el_wire::ErrorCode::InvalidState, "task has no worktree; dispatch first")
    })?;

    let prompt = match &fields.description {
        Some(desc) => format!("{}\n\n{desc}", task.title),
        None => task.title.clone(),
    };
    let record = state
        .sessions
        .start_session(
            assignee.as_str(),
            crate::session::StartOptions {
                working_directory: Some(worktree.path.clone()),
                worktree: Some(worktree.path),
                initial_prompt: Some(prompt),
                interactive: false,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Tear down the task's worker: stop the session, remove the worktree.
pub(super) async fn cleanup(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let task = state.engine.get(&id, false)?;
    let assignee = task.task().and_then(|t| t.assignee);

    if let Some(agent) = assignee {
        if let Some(active) = state.engine.active_session(&agent) {
            let _ = state.sessions.stop_session(active.id.as_str(), true, None).await;
        }
    }

    let worktree = state.engine.with_state(|s| {
        s.worktrees.values().find(|w| w.task_id == Some(task.id)).cloned()
    });
    if let Some(worktree) = worktree {
        state.engine.remove_worktree(&worktree.path, true, Some(true)).await?;
    }
    Ok(Json(json!({ "cleaned": task.id })))
}
