// SPDX-License-Identifier: MIT

use super::*;
use crate::api::{ElementPatch, NewElement};
use crate::error::ElementError;
use crate::test_util::{new_task, test_engine};
use el_core::test_support::actor;
use el_core::{
    DependencyType, ElementBody, FakeClock, Metadata, PlaybookFields, StepDef, TaskStatus,
    VariableDef, VariableType, WorkflowStatus,
};
use serde_json::json;
use std::time::Duration;

fn ship_playbook(engine: &crate::Engine<FakeClock>) -> el_core::ElementId {
    let fields = PlaybookFields {
        name: "ship".to_string(),
        steps: vec![
            StepDef {
                id: "build".to_string(),
                title: "build".to_string(),
                depends_on: vec![],
                condition: None,
                priority: 2,
                complexity: 2,
                description: None,
            },
            StepDef {
                id: "deploy".to_string(),
                title: "deploy".to_string(),
                depends_on: vec!["build".to_string()],
                condition: Some("{{ship}}".to_string()),
                priority: 1,
                complexity: 3,
                description: None,
            },
        ],
        variables: vec![VariableDef {
            name: "ship".to_string(),
            var_type: VariableType::Boolean,
            required: false,
            default: Some(json!(false)),
            one_of: vec![],
        }],
    };
    engine
        .create(NewElement::new("ship", actor(), ElementBody::Playbook(fields)))
        .unwrap()
        .id
}

fn provided(pairs: &[(&str, serde_json::Value)]) -> Metadata {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

#[test]
fn pour_with_default_skips_conditional_step() {
    let (engine, _dir) = test_engine();
    ship_playbook(&engine);

    let outcome = engine
        .pour_workflow("ship", provided(&[]), false, None, actor())
        .unwrap();
    assert_eq!(outcome.task_ids.len(), 1);
    assert_eq!(outcome.skipped_steps, vec!["deploy".to_string()]);
    assert_eq!(outcome.workflow.workflow().unwrap().status, WorkflowStatus::Pending);

    let tasks = engine.workflow_tasks(outcome.workflow.id.as_str()).unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "build");
}

#[test]
fn pour_with_ship_true_wires_blocks_edge() {
    let (engine, _dir) = test_engine();
    ship_playbook(&engine);

    let outcome = engine
        .pour_workflow("ship", provided(&[("ship", json!(true))]), false, None, actor())
        .unwrap();
    assert_eq!(outcome.task_ids.len(), 2);
    assert!(outcome.skipped_steps.is_empty());

    let tasks = engine.workflow_tasks(outcome.workflow.id.as_str()).unwrap();
    let build = tasks.iter().find(|t| t.title == "build").unwrap();
    let deploy = tasks.iter().find(|t| t.title == "deploy").unwrap();

    let deps = engine.get_dependencies(deploy.id.as_str(), None).unwrap();
    assert!(deps
        .iter()
        .any(|d| d.dep_type == DependencyType::Blocks && d.target_id == build.id));
    assert!(deps
        .iter()
        .any(|d| d.dep_type == DependencyType::ParentChild
            && d.target_id == outcome.workflow.id));
}

#[test]
fn pour_resolves_by_id_too() {
    let (engine, _dir) = test_engine();
    let playbook_id = ship_playbook(&engine);
    let outcome = engine
        .pour_workflow(playbook_id.as_str(), provided(&[]), true, Some("custom".into()), actor())
        .unwrap();
    assert_eq!(outcome.workflow.title, "custom");
    assert!(outcome.workflow.workflow().unwrap().ephemeral);
    assert_eq!(outcome.workflow.workflow().unwrap().playbook_id, Some(playbook_id));
}

#[test]
fn pour_unknown_playbook_is_not_found() {
    let (engine, _dir) = test_engine();
    assert!(matches!(
        engine.pour_workflow("nope", provided(&[]), false, None, actor()),
        Err(ElementError::NotFound(_))
    ));
}

#[test]
fn pour_bad_variable_is_validation() {
    let (engine, _dir) = test_engine();
    ship_playbook(&engine);
    assert!(matches!(
        engine.pour_workflow("ship", provided(&[("ship", json!("yes"))]), false, None, actor()),
        Err(ElementError::Validation(_))
    ));
}

#[test]
fn poured_tasks_wait_on_the_workflow() {
    let (engine, _dir) = test_engine();
    ship_playbook(&engine);
    let outcome = engine.pour_workflow("ship", provided(&[]), false, None, actor()).unwrap();

    // Children inherit the pending workflow's incompleteness.
    let progress = engine.workflow_progress(outcome.workflow.id.as_str()).unwrap();
    assert_eq!(progress.total_tasks, 1);
    assert!(progress.ready_tasks.is_empty());
    assert_eq!(progress.blocked_tasks.len(), 1);

    engine
        .update(
            outcome.workflow.id.as_str(),
            ElementPatch { status: Some("running".into()), ..Default::default() },
            None,
        )
        .unwrap();
    let progress = engine.workflow_progress(outcome.workflow.id.as_str()).unwrap();
    assert_eq!(progress.blocked_tasks.len(), 1);

    engine
        .update(
            outcome.workflow.id.as_str(),
            ElementPatch { status: Some("completed".into()), ..Default::default() },
            None,
        )
        .unwrap();
    let progress = engine.workflow_progress(outcome.workflow.id.as_str()).unwrap();
    assert_eq!(progress.ready_tasks.len(), 1);
    assert!(progress.blocked_tasks.is_empty());
}

#[test]
fn progress_counts_statuses_and_completion() {
    let (engine, _dir) = test_engine();
    ship_playbook(&engine);
    let outcome = engine
        .pour_workflow("ship", provided(&[("ship", json!(true))]), false, None, actor())
        .unwrap();

    let tasks = engine.workflow_tasks(outcome.workflow.id.as_str()).unwrap();
    let build = tasks.iter().find(|t| t.title == "build").unwrap();
    engine.close_task(build.id.as_str(), None).unwrap();

    let progress = engine.workflow_progress(outcome.workflow.id.as_str()).unwrap();
    assert_eq!(progress.total_tasks, 2);
    assert_eq!(progress.status_counts.get("closed"), Some(&1));
    assert_eq!(progress.status_counts.get("open"), Some(&1));
    assert_eq!(progress.completion_percentage, 50);
}

#[test]
fn progress_on_empty_workflow_is_zero() {
    let (engine, _dir) = test_engine();
    let workflow = engine
        .create(NewElement::new(
            "empty",
            actor(),
            ElementBody::Workflow(Default::default()),
        ))
        .unwrap();
    let progress = engine.workflow_progress(workflow.id.as_str()).unwrap();
    assert_eq!(progress.total_tasks, 0);
    assert_eq!(progress.completion_percentage, 0);
}

#[test]
fn squash_is_idempotent() {
    let (engine, _dir) = test_engine();
    ship_playbook(&engine);
    let outcome = engine.pour_workflow("ship", provided(&[]), true, None, actor()).unwrap();
    let id = outcome.workflow.id;

    let squashed = engine.squash_workflow(id.as_str()).unwrap();
    assert!(!squashed.workflow().unwrap().ephemeral);
    let version = squashed.version;

    // Second squash is a no-op, not another version bump.
    let again = engine.squash_workflow(id.as_str()).unwrap();
    assert_eq!(again.version, version);
}

#[test]
fn burn_requires_ephemeral_unless_forced() {
    let (engine, _dir) = test_engine();
    ship_playbook(&engine);
    let durable = engine.pour_workflow("ship", provided(&[]), false, None, actor()).unwrap();

    assert!(matches!(
        engine.burn_workflow(durable.workflow.id.as_str(), false),
        Err(ElementError::InvalidState(_))
    ));
    engine.burn_workflow(durable.workflow.id.as_str(), true).unwrap();
}

#[test]
fn burn_removes_workflow_tasks_and_edges() {
    let (engine, _dir) = test_engine();
    ship_playbook(&engine);
    let outcome = engine
        .pour_workflow("ship", provided(&[("ship", json!(true))]), true, None, actor())
        .unwrap();

    // An outside task blocking on a doomed one must be released.
    let outside = engine.create(new_task("outsider")).unwrap();
    let inside = outcome.task_ids[0];
    engine
        .add_dependency(
            outside.id.as_str(),
            inside.as_str(),
            DependencyType::Blocks,
            Metadata::new(),
            actor(),
        )
        .unwrap();
    assert!(engine.with_state(|s| s.blocked.contains_key(outside.id.as_str())));

    let purged = engine.burn_workflow(outcome.workflow.id.as_str(), false).unwrap();
    assert_eq!(purged.len(), 3); // two tasks + workflow

    assert!(matches!(
        engine.get(outcome.workflow.id.as_str(), true),
        Err(ElementError::NotFound(_))
    ));
    for task_id in &outcome.task_ids {
        assert!(engine.get(task_id.as_str(), true).is_err());
    }
    assert!(engine.with_state(|s| !s.blocked.contains_key(outside.id.as_str())));
}

#[test]
fn burn_tombstoned_workflow_is_not_found() {
    let (engine, _dir) = test_engine();
    ship_playbook(&engine);
    let outcome = engine.pour_workflow("ship", provided(&[]), true, None, actor()).unwrap();
    engine.delete(outcome.workflow.id.as_str()).unwrap();

    assert!(matches!(
        engine.burn_workflow(outcome.workflow.id.as_str(), false),
        Err(ElementError::NotFound(_))
    ));
}

#[test]
fn gc_collects_expired_terminal_ephemerals() {
    let (engine, _dir) = test_engine();
    ship_playbook(&engine);
    let outcome = engine.pour_workflow("ship", provided(&[]), true, None, actor()).unwrap();
    let id = outcome.workflow.id;

    // Terminal + ephemeral, but not old enough yet.
    engine
        .update(id.as_str(), ElementPatch { status: Some("running".into()), ..Default::default() }, None)
        .unwrap();
    engine
        .update(id.as_str(), ElementPatch { status: Some("completed".into()), ..Default::default() }, None)
        .unwrap();

    let report = engine.gc_workflows(60_000, true).unwrap();
    assert!(report.candidates.is_empty());

    engine.clock().advance(Duration::from_secs(61));
    let report = engine.gc_workflows(60_000, true).unwrap();
    assert_eq!(report.candidates, vec![id]);
    assert_eq!(report.burned, 0);
    assert!(engine.get(id.as_str(), false).is_ok());

    let report = engine.gc_workflows(60_000, false).unwrap();
    assert_eq!(report.burned, 1);
    assert!(engine.get(id.as_str(), true).is_err());
}

#[test]
fn gc_skips_durable_and_running_workflows() {
    let (engine, _dir) = test_engine();
    ship_playbook(&engine);
    let durable = engine.pour_workflow("ship", provided(&[]), false, None, actor()).unwrap();
    let running = engine.pour_workflow("ship", provided(&[]), true, None, actor()).unwrap();
    engine
        .update(
            durable.workflow.id.as_str(),
            ElementPatch { status: Some("cancelled".into()), ..Default::default() },
            None,
        )
        .unwrap();
    engine
        .update(
            running.workflow.id.as_str(),
            ElementPatch { status: Some("running".into()), ..Default::default() },
            None,
        )
        .unwrap();

    engine.clock().advance(Duration::from_secs(3600));
    let report = engine.gc_workflows(1_000, true).unwrap();
    assert!(report.candidates.is_empty());
}

#[test]
fn task_status_counts_use_closed_for_completion() {
    let (engine, _dir) = test_engine();
    ship_playbook(&engine);
    let outcome = engine
        .pour_workflow("ship", provided(&[("ship", json!(true))]), false, None, actor())
        .unwrap();
    for task_id in &outcome.task_ids {
        // Tasks are blocked by the pending workflow, but closing is still
        // a legal transition from open.
        let el = engine.get(task_id.as_str(), false).unwrap();
        assert_eq!(el.task().unwrap().status, TaskStatus::Open);
        engine.close_task(task_id.as_str(), None).unwrap();
    }
    let progress = engine.workflow_progress(outcome.workflow.id.as_str()).unwrap();
    assert_eq!(progress.completion_percentage, 100);
}
