// SPDX-License-Identifier: MIT

//! Dependency graph and blocked cache end to end.

use super::support::{actor, fake_clock_engine, http_app, new_task, send};
use el_core::{Clock, DependencyType, Metadata};
use el_engine::TaskFilter;
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn ready_excludes_blocked_over_http() {
    let (app, _engine, _dir) = http_app();

    let (_, t1) = send(
        &app,
        "POST",
        "/api/tasks",
        Some(json!({ "title": "T1", "createdBy": "el-0000" })),
    )
    .await;
    let (_, t2) = send(
        &app,
        "POST",
        "/api/tasks",
        Some(json!({ "title": "T2", "createdBy": "el-0000" })),
    )
    .await;
    let (t1_id, t2_id) = (t1["id"].as_str().unwrap(), t2["id"].as_str().unwrap());

    send(
        &app,
        "POST",
        "/api/dependencies",
        Some(json!({ "sourceId": t2_id, "targetId": t1_id, "type": "blocks" })),
    )
    .await;

    let (_, ready) = send(&app, "GET", "/api/tasks/ready", None).await;
    let ready_ids: Vec<&str> =
        ready["tasks"].as_array().unwrap().iter().map(|t| t["id"].as_str().unwrap()).collect();
    assert_eq!(ready_ids, vec![t1_id]);

    let (_, blocked) = send(&app, "GET", "/api/tasks/blocked", None).await;
    let entries = blocked.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["task"]["id"], json!(t2_id));
    assert_eq!(entries[0]["blockedBy"], json!(t1_id));
    assert_eq!(entries[0]["reason"], json!("Blocked by T1 (blocks dependency)"));

    // Closing T1 releases T2; closed tasks leave the ready pool.
    send(
        &app,
        "PATCH",
        &format!("/api/tasks/{t1_id}"),
        Some(json!({ "status": "closed" })),
    )
    .await;
    let (_, ready) = send(&app, "GET", "/api/tasks/ready", None).await;
    let ready_ids: Vec<&str> =
        ready["tasks"].as_array().unwrap().iter().map(|t| t["id"].as_str().unwrap()).collect();
    assert_eq!(ready_ids, vec![t2_id]);
}

#[tokio::test]
async fn parent_child_blocks_until_workflow_completes() {
    let (app, _engine, _dir) = http_app();

    let (_, workflow) =
        send(&app, "POST", "/api/workflows", Some(json!({ "title": "W" }))).await;
    let (_, child) = send(&app, "POST", "/api/tasks", Some(json!({ "title": "C1" }))).await;
    let (w_id, c_id) = (workflow["id"].as_str().unwrap(), child["id"].as_str().unwrap());

    send(
        &app,
        "POST",
        "/api/dependencies",
        Some(json!({ "sourceId": c_id, "targetId": w_id, "type": "parent-child" })),
    )
    .await;

    let ready_ids = |ready: &serde_json::Value| -> Vec<String> {
        ready["tasks"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["id"].as_str().unwrap().to_string())
            .collect()
    };

    let (_, ready) = send(&app, "GET", "/api/tasks/ready", None).await;
    assert!(ready_ids(&ready).is_empty());

    // Running is still not completed.
    send(
        &app,
        "PATCH",
        &format!("/api/workflows/{w_id}"),
        Some(json!({ "status": "running" })),
    )
    .await;
    let (_, ready) = send(&app, "GET", "/api/tasks/ready", None).await;
    assert!(ready_ids(&ready).is_empty());

    send(
        &app,
        "PATCH",
        &format!("/api/workflows/{w_id}"),
        Some(json!({ "status": "completed" })),
    )
    .await;
    let (_, ready) = send(&app, "GET", "/api/tasks/ready", None).await;
    assert_eq!(ready_ids(&ready), vec![c_id.to_string()]);
}

#[tokio::test]
async fn cycle_rejection_leaves_state_unchanged() {
    let (app, engine, _dir) = http_app();

    let mut ids = Vec::new();
    for title in ["A", "B", "C"] {
        let (_, t) = send(&app, "POST", "/api/tasks", Some(json!({ "title": title }))).await;
        ids.push(t["id"].as_str().unwrap().to_string());
    }
    let (a, b, c) = (&ids[0], &ids[1], &ids[2]);

    for (source, target) in [(b, a), (c, b)] {
        let (status, _) = send(
            &app,
            "POST",
            "/api/dependencies",
            Some(json!({ "sourceId": source, "targetId": target, "type": "blocks" })),
        )
        .await;
        assert_eq!(status, axum::http::StatusCode::CREATED);
    }

    let (status, body) = send(
        &app,
        "POST",
        "/api/dependencies",
        Some(json!({ "sourceId": a, "targetId": c, "type": "blocks" })),
    )
    .await;
    assert_eq!(status, axum::http::StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], json!("VALIDATION_ERROR"));

    // A gained no outgoing edge and is still unblocked.
    assert!(engine.get_dependencies(a, None).unwrap().is_empty());
    assert!(engine.with_state(|s| !s.blocked.contains_key(a.as_str())));
}

#[tokio::test]
async fn timer_gate_opens_after_deadline_tick() {
    let (engine, _dir) = fake_clock_engine();
    let task = engine.create(new_task("X")).unwrap();
    let gate = engine.create(new_task("X-gate")).unwrap();

    let wait_until = engine.clock().now_utc() + chrono::Duration::milliseconds(100);
    let metadata: Metadata = serde_json::from_value(json!({
        "gate": "timer",
        "waitUntil": wait_until.to_rfc3339(),
    }))
    .unwrap();
    engine
        .add_dependency(
            task.id.as_str(),
            gate.id.as_str(),
            DependencyType::Awaits,
            metadata,
            actor(),
        )
        .unwrap();

    assert!(engine.ready_tasks(&TaskFilter::default()).iter().all(|t| t.id != task.id));

    engine.clock().advance(Duration::from_millis(101));
    engine.tick_timers();

    assert!(engine.ready_tasks(&TaskFilter::default()).iter().any(|t| t.id == task.id));
}

#[tokio::test]
async fn add_then_remove_dependency_restores_the_cache() {
    let (engine, _dir) = fake_clock_engine();
    let a = engine.create(new_task("A")).unwrap();
    let b = engine.create(new_task("B")).unwrap();

    let before = engine.with_state(|s| s.blocked.clone());
    engine
        .add_dependency(
            a.id.as_str(),
            b.id.as_str(),
            DependencyType::Blocks,
            Metadata::new(),
            actor(),
        )
        .unwrap();
    engine.remove_dependency(a.id.as_str(), b.id.as_str(), DependencyType::Blocks).unwrap();
    let after = engine.with_state(|s| s.blocked.clone());

    assert_eq!(before, after);
}
