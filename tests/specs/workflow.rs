// SPDX-License-Identifier: MIT

//! Pour, squash, burn, and gc end to end.

use super::support::{actor, fake_clock_engine};
use el_core::{DependencyType, ElementBody, Metadata, PlaybookFields, StepDef, VariableDef,
    VariableType};
use el_engine::{ElementError, NewElement};
use serde_json::json;

fn build_deploy_playbook(engine: &el_engine::Engine<el_core::FakeClock>) {
    let fields = PlaybookFields {
        name: "p".to_string(),
        steps: vec![
            StepDef {
                id: "build".to_string(),
                title: "build".to_string(),
                depends_on: vec![],
                condition: None,
                priority: 3,
                complexity: 3,
                description: None,
            },
            StepDef {
                id: "deploy".to_string(),
                title: "deploy".to_string(),
                depends_on: vec!["build".to_string()],
                condition: Some("{{ship}}".to_string()),
                priority: 3,
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
        .create(NewElement::new("p", actor(), ElementBody::Playbook(fields)))
        .unwrap();
}

fn vars(pairs: &[(&str, serde_json::Value)]) -> Metadata {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

#[tokio::test]
async fn pour_with_condition_default_creates_build_only() {
    let (engine, _dir) = fake_clock_engine();
    build_deploy_playbook(&engine);

    let outcome = engine.pour_workflow("p", vars(&[]), false, None, actor()).unwrap();
    let tasks = engine.workflow_tasks(outcome.workflow.id.as_str()).unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "build");
    assert_eq!(outcome.skipped_steps, vec!["deploy".to_string()]);
}

#[tokio::test]
async fn pour_with_ship_true_creates_both_with_blocks_edge() {
    let (engine, _dir) = fake_clock_engine();
    build_deploy_playbook(&engine);

    let outcome = engine
        .pour_workflow("p", vars(&[("ship", json!(true))]), false, None, actor())
        .unwrap();
    let tasks = engine.workflow_tasks(outcome.workflow.id.as_str()).unwrap();
    assert_eq!(tasks.len(), 2);

    let build = tasks.iter().find(|t| t.title == "build").unwrap();
    let deploy = tasks.iter().find(|t| t.title == "deploy").unwrap();
    let deploy_deps = engine.get_dependencies(deploy.id.as_str(), None).unwrap();
    assert!(deploy_deps
        .iter()
        .any(|d| d.dep_type == DependencyType::Blocks && d.target_id == build.id));
}

#[tokio::test]
async fn pour_is_structurally_deterministic() {
    let (engine, _dir) = fake_clock_engine();
    build_deploy_playbook(&engine);

    let one = engine
        .pour_workflow("p", vars(&[("ship", json!(true))]), true, None, actor())
        .unwrap();
    let two = engine
        .pour_workflow("p", vars(&[("ship", json!(true))]), true, None, actor())
        .unwrap();

    // Same shape modulo fresh ids: task count, titles, edge structure.
    let tasks_of = |id: &el_core::ElementId| {
        let mut tasks = engine.workflow_tasks(id.as_str()).unwrap();
        tasks.sort_by(|a, b| a.title.cmp(&b.title));
        tasks
    };
    let one_tasks = tasks_of(&one.workflow.id);
    let two_tasks = tasks_of(&two.workflow.id);
    assert_eq!(
        one_tasks.iter().map(|t| &t.title).collect::<Vec<_>>(),
        two_tasks.iter().map(|t| &t.title).collect::<Vec<_>>()
    );
    for (a, b) in one_tasks.iter().zip(&two_tasks) {
        let a_types: Vec<_> = engine
            .get_dependencies(a.id.as_str(), None)
            .unwrap()
            .iter()
            .map(|d| d.dep_type)
            .collect();
        let b_types: Vec<_> = engine
            .get_dependencies(b.id.as_str(), None)
            .unwrap()
            .iter()
            .map(|d| d.dep_type)
            .collect();
        assert_eq!(a_types, b_types);
    }
}

#[tokio::test]
async fn squash_is_idempotent_and_burn_rejects_tombstones() {
    let (engine, _dir) = fake_clock_engine();
    build_deploy_playbook(&engine);
    let outcome = engine.pour_workflow("p", vars(&[]), true, None, actor()).unwrap();
    let id = outcome.workflow.id;

    let first = engine.squash_workflow(id.as_str()).unwrap();
    let second = engine.squash_workflow(id.as_str()).unwrap();
    assert_eq!(first.version, second.version);
    assert!(!second.workflow().unwrap().ephemeral);

    engine.delete(id.as_str()).unwrap();
    assert!(matches!(
        engine.burn_workflow(id.as_str(), true),
        Err(ElementError::NotFound(_))
    ));
}
