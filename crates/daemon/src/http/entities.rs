// SPDX-License-Identifier: MIT

//! Entity routes.

use super::error::ApiError;
use super::{ApiJson, AppState};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use el_core::{ElementBody, ElementKind, EntityId, EntityType};
use el_engine::{ElementFilter, NewElement};
use el_wire::RegisterEntityRequest;

pub(super) async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterEntityRequest>,
) -> Result<(StatusCode, Json<el_core::Element>), ApiError> {
    let entity_type = match req.entity_type.as_str() {
        "agent" => EntityType::Agent,
        "human" => EntityType::Human,
        "system" => EntityType::System,
        other => {
            return Err(ApiError::invalid_input(format!("unknown entity type: {other}")));
        }
    };
    let element = state.engine.create(NewElement::new(
        req.name,
        EntityId::from_string(el_core::SYSTEM_ENTITY),
        ElementBody::Entity { entity_type },
    ))?;
    Ok((StatusCode::CREATED, Json(element)))
}

pub(super) async fn list(State(state): State<AppState>) -> Json<Vec<el_core::Element>> {
    Json(state.engine.list(&ElementFilter::kind(ElementKind::Entity)))
}
