// SPDX-License-Identifier: MIT

//! Shared spec fixtures.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use el_core::{ElementBody, EntityId, EntityType, FakeClock, TaskFields, SYSTEM_ENTITY};
use el_daemon::config::Config;
use el_daemon::http::{router, AppState};
use el_daemon::session::{AgentCommand, SessionManager, SessionSettings};
use el_engine::{Engine, NewElement, WorktreeConfig};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::util::ServiceExt;

pub fn actor() -> EntityId {
    EntityId::from_string(SYSTEM_ENTITY)
}

/// Engine with a controllable clock, over a throwaway store.
pub fn fake_clock_engine() -> (Engine<FakeClock>, TempDir) {
    let dir = TempDir::new().unwrap();
    let engine = Engine::open_with_clock(
        &dir.path().join("state"),
        WorktreeConfig::new(dir.path()),
        FakeClock::new(),
    )
    .unwrap();
    engine.ensure_system_entity().unwrap();
    (engine, dir)
}

pub fn new_task(title: &str) -> NewElement {
    NewElement::new(title, actor(), ElementBody::Task(TaskFields::default()))
}

/// Full HTTP stack over a system-clock engine, with `/bin/sh` as the
/// agent program so sessions are scriptable.
pub fn http_app() -> (axum::Router, Arc<Engine>, TempDir) {
    let dir = TempDir::new().unwrap();
    let engine = Arc::new(
        Engine::open(&dir.path().join("state"), WorktreeConfig::new(dir.path())).unwrap(),
    );
    engine.ensure_system_entity().unwrap();
    let sessions = SessionManager::new(Arc::clone(&engine), sh_settings());
    let state = AppState {
        engine: Arc::clone(&engine),
        sessions,
        config: Arc::new(Config::default()),
    };
    (router(state), engine, dir)
}

pub fn sh_settings() -> SessionSettings {
    SessionSettings {
        agent: AgentCommand {
            program: "/bin/sh".to_string(),
            headless_args: vec!["-c".to_string()],
            interactive_args: vec!["-c".to_string()],
            resume_flag: "--resume".to_string(),
        },
        graceful_stop_timeout: Duration::from_secs(2),
        queue_capacity: 64,
    }
}

/// Session manager over its own engine, for fan-out specs.
pub fn sh_manager() -> (Arc<SessionManager>, Arc<Engine>, el_core::ElementId, TempDir) {
    let dir = TempDir::new().unwrap();
    let engine = Arc::new(
        Engine::open(&dir.path().join("state"), WorktreeConfig::new(dir.path())).unwrap(),
    );
    engine.ensure_system_entity().unwrap();
    let agent = engine
        .create(NewElement::new(
            "claude",
            actor(),
            ElementBody::Entity { entity_type: EntityType::Agent },
        ))
        .unwrap();
    let manager = SessionManager::new(Arc::clone(&engine), sh_settings());
    (manager, engine, agent.id, dir)
}

pub async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => {
            builder = builder.header("content-type", "application/json");
            builder.body(Body::from(body.to_string())).unwrap()
        }
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1 << 20).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}
