// SPDX-License-Identifier: MIT

//! Dependency routes.

use super::error::ApiError;
use super::{ApiJson, AppState};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use el_core::{Dependency, DependencyType, EntityId};
use el_engine::DependencyTreeNode;
use el_wire::AddDependencyRequest;
use serde::Deserialize;
use serde_json::json;

fn parse_dep_type(s: &str) -> Result<DependencyType, ApiError> {
    DependencyType::parse(s)
        .ok_or_else(|| ApiError::invalid_input(format!("unknown dependency type: {s}")))
}

#[derive(Debug, Deserialize)]
pub(super) struct TypesQuery {
    /// Comma-separated dependency types.
    types: Option<String>,
}

fn parse_types(query: &TypesQuery) -> Result<Option<Vec<DependencyType>>, ApiError> {
    query
        .types
        .as_deref()
        .map(|raw| raw.split(',').map(str::trim).map(parse_dep_type).collect())
        .transpose()
}

pub(super) async fn add(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<AddDependencyRequest>,
) -> Result<(StatusCode, Json<Dependency>), ApiError> {
    let dep_type = parse_dep_type(&req.dep_type)?;
    let created_by = req
        .created_by
        .map(EntityId::from_string)
        .unwrap_or_else(|| EntityId::from_string(el_core::SYSTEM_ENTITY));
    let dependency = state.engine.add_dependency(
        &req.source_id,
        &req.target_id,
        dep_type,
        req.metadata,
        created_by,
    )?;
    Ok((StatusCode::CREATED, Json(dependency)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RemoveQuery {
    source_id: String,
    target_id: String,
    #[serde(rename = "type")]
    dep_type: String,
}

pub(super) async fn remove(
    State(state): State<AppState>,
    Query(query): Query<RemoveQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let dep_type = parse_dep_type(&query.dep_type)?;
    state.engine.remove_dependency(&query.source_id, &query.target_id, dep_type)?;
    Ok(Json(json!({ "removed": true })))
}

pub(super) async fn list_dependencies(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<TypesQuery>,
) -> Result<Json<Vec<Dependency>>, ApiError> {
    let types = parse_types(&query)?;
    Ok(Json(state.engine.get_dependencies(&id, types.as_deref())?))
}

pub(super) async fn list_dependents(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<TypesQuery>,
) -> Result<Json<Vec<Dependency>>, ApiError> {
    let types = parse_types(&query)?;
    Ok(Json(state.engine.get_dependents(&id, types.as_deref())?))
}

#[derive(Debug, Deserialize)]
pub(super) struct TreeQuery {
    depth: Option<usize>,
}

pub(super) async fn tree(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<TreeQuery>,
) -> Result<Json<DependencyTreeNode>, ApiError> {
    let depth = query.depth.unwrap_or(3).min(10);
    Ok(Json(state.engine.get_dependency_tree(&id, depth)?))
}
