// SPDX-License-Identifier: MIT

//! Test fixtures and proptest strategies shared across crates.

use crate::dependency::{Dependency, DependencyType, Gate};
use crate::element::{
    Element, ElementBody, ElementId, EntityId, EntityType, Metadata, SYSTEM_ENTITY,
};
use crate::playbook::{PlaybookFields, StepDef, VariableDef};
use crate::task::{TaskFields, TaskStatus};
use crate::workflow::WorkflowFields;
use chrono::{DateTime, TimeZone, Utc};

/// Fixed timestamp for deterministic fixtures.
pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single().unwrap_or_default()
}

/// Bootstrap actor used by fixtures.
pub fn actor() -> EntityId {
    EntityId::from_string(SYSTEM_ENTITY)
}

pub fn task_element(title: &str) -> Element {
    Element::new(
        ElementId::new(),
        title,
        actor(),
        fixed_time(),
        ElementBody::Task(TaskFields::default()),
    )
}

pub fn task_element_with_status(title: &str, status: TaskStatus) -> Element {
    let mut el = task_element(title);
    if let Some(task) = el.task_mut() {
        task.status = status;
    }
    el
}

pub fn workflow_element(title: &str) -> Element {
    Element::new(
        ElementId::new(),
        title,
        actor(),
        fixed_time(),
        ElementBody::Workflow(WorkflowFields::default()),
    )
}

pub fn entity_element(title: &str, entity_type: EntityType) -> Element {
    Element::new(
        ElementId::new(),
        title,
        actor(),
        fixed_time(),
        ElementBody::Entity { entity_type },
    )
}

pub fn playbook_element(name: &str, steps: Vec<StepDef>, variables: Vec<VariableDef>) -> Element {
    Element::new(
        ElementId::new(),
        name,
        actor(),
        fixed_time(),
        ElementBody::Playbook(PlaybookFields { name: name.to_string(), steps, variables }),
    )
}

pub fn step(id: &str, depends_on: &[&str]) -> StepDef {
    StepDef {
        id: id.to_string(),
        title: id.to_string(),
        depends_on: depends_on.iter().map(|s| s.to_string()).collect(),
        condition: None,
        priority: 3,
        complexity: 3,
        description: None,
    }
}

pub fn dep(source: ElementId, target: ElementId, dep_type: DependencyType) -> Dependency {
    Dependency {
        source_id: source,
        target_id: target,
        dep_type,
        gate: None,
        metadata: Metadata::new(),
        created_by: actor(),
        created_at: fixed_time(),
    }
}

pub fn awaits(source: ElementId, target: ElementId, gate: Gate) -> Dependency {
    Dependency {
        source_id: source,
        target_id: target,
        dep_type: DependencyType::Awaits,
        gate: Some(gate),
        metadata: Metadata::new(),
        created_by: actor(),
        created_at: fixed_time(),
    }
}

pub mod strategies {
    use super::*;
    use proptest::prelude::*;

    pub fn arb_task_status() -> impl Strategy<Value = TaskStatus> {
        prop_oneof![
            Just(TaskStatus::Open),
            Just(TaskStatus::InProgress),
            Just(TaskStatus::Blocked),
            Just(TaskStatus::Deferred),
            Just(TaskStatus::Closed),
        ]
    }

    pub fn arb_blocking_type() -> impl Strategy<Value = DependencyType> {
        prop_oneof![Just(DependencyType::Blocks), Just(DependencyType::ParentChild)]
    }
}
