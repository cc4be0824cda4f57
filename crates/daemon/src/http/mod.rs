// SPDX-License-Identifier: MIT

//! HTTP surface: thin axum adapters over the engine and session manager.

mod agents;
mod deps;
mod entities;
mod error;
mod sessions;
mod sse;
mod tasks;
mod workflows;

pub use error::ApiError;

use crate::config::Config;
use crate::session::SessionManager;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::routing::{get, post};
use axum::Router;
use el_core::SystemClock;
use el_engine::Engine;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine<SystemClock>>,
    pub sessions: Arc<SessionManager<SystemClock>>,
    pub config: Arc<Config>,
}

/// `axum::Json` with rejections mapped into the stable error body.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let axum::Json(value) = axum::Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        // tasks
        .route("/api/tasks", post(tasks::create).get(tasks::list))
        .route("/api/tasks/ready", get(tasks::ready))
        .route("/api/tasks/blocked", get(tasks::blocked))
        .route(
            "/api/tasks/{id}",
            get(tasks::detail).patch(tasks::update).delete(tasks::remove),
        )
        .route("/api/tasks/{id}/start", post(tasks::start))
        .route("/api/tasks/{id}/dispatch", post(tasks::dispatch))
        .route("/api/tasks/{id}/start-worker", post(tasks::start_worker))
        .route("/api/tasks/{id}/complete", post(tasks::complete))
        .route("/api/tasks/{id}/cleanup", post(tasks::cleanup))
        // dependencies
        .route("/api/dependencies", post(deps::add).delete(deps::remove))
        .route("/api/elements/{id}/dependencies", get(deps::list_dependencies))
        .route("/api/elements/{id}/dependents", get(deps::list_dependents))
        .route("/api/elements/{id}/tree", get(deps::tree))
        // workflows
        .route("/api/workflows", post(workflows::create).get(workflows::list))
        .route("/api/workflows/pour", post(workflows::pour))
        .route("/api/workflows/gc", post(workflows::gc))
        .route("/api/workflows/{id}", get(workflows::detail).patch(workflows::update))
        .route("/api/workflows/{id}/progress", get(workflows::progress))
        .route("/api/workflows/{id}/tasks", get(workflows::tasks))
        .route("/api/workflows/{id}/squash", post(workflows::squash))
        .route("/api/workflows/{id}/burn", post(workflows::burn))
        // entities
        .route("/api/entities", post(entities::register).get(entities::list))
        // agent sessions
        .route("/api/agents/{id}/start", post(agents::start))
        .route("/api/agents/{id}/stop", post(agents::stop))
        .route("/api/agents/{id}/interrupt", post(agents::interrupt))
        .route("/api/agents/{id}/resume", post(agents::resume))
        .route("/api/agents/{id}/input", post(agents::input))
        .route("/api/agents/{id}/stream", get(sse::stream))
        // session queries
        .route("/api/sessions", get(sessions::list))
        .route("/api/sessions/{id}", get(sessions::detail))
        .route("/api/sessions/{id}/messages", get(sessions::messages))
        .with_state(state)
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
