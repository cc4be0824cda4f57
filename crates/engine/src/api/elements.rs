// SPDX-License-Identifier: MIT

//! Element CRUD and listing.

use crate::blocked;
use crate::bus::{ChangeAction, ChangeEvent};
use crate::engine::Engine;
use crate::error::ElementError;
use chrono::{DateTime, Utc};
use el_core::{
    task, Clock, Element, ElementBody, ElementId, ElementKind, EntityId, Event, Metadata,
    TaskStatus, TaskType, WorkflowStatus,
};
use std::collections::BTreeSet;

/// Input for `create`.
#[derive(Debug, Clone)]
pub struct NewElement {
    pub title: String,
    pub tags: BTreeSet<String>,
    pub metadata: Metadata,
    pub created_by: EntityId,
    pub body: ElementBody,
}

impl NewElement {
    pub fn new(title: impl Into<String>, created_by: EntityId, body: ElementBody) -> Self {
        Self {
            title: title.into(),
            tags: BTreeSet::new(),
            metadata: Metadata::new(),
            created_by,
            body,
        }
    }

    el_core::setters! {
        set {
            tags: BTreeSet<String>,
            metadata: Metadata,
        }
    }
}

/// Typed partial update. Only `Some` fields are applied; double-`Option`
/// fields distinguish "leave alone" from "clear".
#[derive(Debug, Clone, Default)]
pub struct ElementPatch {
    pub title: Option<String>,
    pub tags: Option<BTreeSet<String>>,
    pub metadata: Option<Metadata>,
    /// Parsed against the element's kind-specific status enum.
    pub status: Option<String>,
    pub priority: Option<u8>,
    pub complexity: Option<u8>,
    pub task_type: Option<TaskType>,
    pub description: Option<Option<String>>,
    pub assignee: Option<Option<EntityId>>,
    pub owner: Option<Option<EntityId>>,
    pub scheduled_for: Option<Option<DateTime<Utc>>>,
    pub deadline: Option<Option<DateTime<Utc>>>,
    pub close_reason: Option<Option<String>>,
    pub ephemeral: Option<bool>,
    pub variables: Option<Metadata>,
    pub failure_reason: Option<Option<String>>,
    pub cancel_reason: Option<Option<String>>,
    pub content: Option<Option<String>>,
}

/// List/search filter.
#[derive(Debug, Clone, Default)]
pub struct ElementFilter {
    pub kind: Option<ElementKind>,
    /// Matches the element's status label (incl. `tombstone`).
    pub status: Option<String>,
    pub assignee: Option<EntityId>,
    pub unassigned: bool,
    pub tag: Option<String>,
    pub include_deleted: bool,
    pub limit: Option<usize>,
}

impl ElementFilter {
    pub fn kind(kind: ElementKind) -> Self {
        Self { kind: Some(kind), ..Default::default() }
    }

    pub(crate) fn matches(&self, element: &Element) -> bool {
        if !self.include_deleted && element.is_deleted() {
            return false;
        }
        if let Some(kind) = self.kind {
            if element.kind() != kind {
                return false;
            }
        }
        if let Some(status) = &self.status {
            if element.status_label() != status {
                return false;
            }
        }
        if let Some(assignee) = &self.assignee {
            if element.task().and_then(|t| t.assignee.as_ref()) != Some(assignee) {
                return false;
            }
        }
        if self.unassigned && element.task().map(|t| t.assignee.is_some()).unwrap_or(false) {
            return false;
        }
        if let Some(tag) = &self.tag {
            if !element.tags.contains(tag) {
                return false;
            }
        }
        true
    }
}

/// One page of a paginated listing.
#[derive(Debug, Clone)]
pub struct Page {
    pub items: Vec<Element>,
    pub total: usize,
    pub offset: usize,
}

impl<C: Clock> Engine<C> {
    /// Create an element. Defaults are materialized so `create → get`
    /// returns the canonical form.
    pub fn create(&self, new: NewElement) -> Result<Element, ElementError> {
        validate_new(&new)?;

        let now = self.clock().now_utc();
        let mut element =
            Element::new(ElementId::new(), new.title, new.created_by, now, new.body);
        element.tags = new.tags;
        element.metadata = new.metadata;

        {
            let mut state = self.state().lock();
            if let Some(playbook) = element.playbook() {
                if state.playbook_by_ref(&playbook.name).is_some() {
                    return Err(ElementError::Validation(format!(
                        "playbook name already in use: {}",
                        playbook.name
                    )));
                }
            }
            self.commit_locked(&mut state, Event::ElementCreated { element: element.clone() })?;
        }

        self.publish(ChangeEvent::Element { id: element.id, action: ChangeAction::Created });
        Ok(element)
    }

    /// Seed the bootstrap system entity under its well-known id.
    /// Idempotent.
    pub fn ensure_system_entity(&self) -> Result<(), ElementError> {
        let id = ElementId::from_string(el_core::SYSTEM_ENTITY);
        let now = self.clock().now_utc();
        let mut state = self.state().lock();
        if state.element(id.as_str()).is_some() {
            return Ok(());
        }
        let element = Element::new(
            id,
            "system",
            id,
            now,
            ElementBody::Entity { entity_type: el_core::EntityType::System },
        );
        self.commit_locked(&mut state, Event::ElementCreated { element })?;
        Ok(())
    }

    /// Get by id. Tombstoned elements are hidden unless opted into.
    pub fn get(&self, id: &str, include_deleted: bool) -> Result<Element, ElementError> {
        let state = self.state().lock();
        state
            .element(id)
            .filter(|e| include_deleted || !e.is_deleted())
            .cloned()
            .ok_or_else(|| ElementError::NotFound(id.to_string()))
    }

    /// Apply a partial update.
    ///
    /// With `expected_version`, a stale version is a conflict; without it,
    /// last-writer-wins (the version still bumps, so interleaved writers
    /// are detectable after the fact).
    pub fn update(
        &self,
        id: &str,
        patch: ElementPatch,
        expected_version: Option<u64>,
    ) -> Result<Element, ElementError> {
        let now = self.clock().now_utc();
        let updated;
        {
            let mut state = self.state().lock();
            let current = state
                .element(id)
                .filter(|e| !e.is_deleted())
                .ok_or_else(|| ElementError::NotFound(id.to_string()))?;

            if let Some(expected) = expected_version {
                if current.version != expected {
                    return Err(ElementError::ConcurrentModification {
                        id: current.id,
                        expected,
                        actual: current.version,
                    });
                }
            }

            let was_complete = current.is_blocking_complete();
            let mut next = current.clone();
            apply_patch(&mut next, &patch, now)?;
            next.version += 1;
            next.updated_at = now;
            updated = next.clone();

            self.commit_locked(&mut state, Event::ElementUpdated { element: next })?;

            // A completion flip changes what this element's dependents see.
            if was_complete != updated.is_blocking_complete() {
                blocked::invalidate_dependents(&mut state, &updated.id, now);
            }
        }

        self.publish(ChangeEvent::Element { id: updated.id, action: ChangeAction::Updated });
        Ok(updated)
    }

    /// Soft delete: tombstone the element and release everything that was
    /// blocked on it.
    pub fn delete(&self, id: &str) -> Result<(), ElementError> {
        let now = self.clock().now_utc();
        let element_id;
        {
            let mut state = self.state().lock();
            let current = state
                .element(id)
                .filter(|e| !e.is_deleted())
                .ok_or_else(|| ElementError::NotFound(id.to_string()))?;
            element_id = current.id;

            self.commit_locked(&mut state, Event::ElementDeleted { id: element_id, at: now })?;
            state.blocked.remove(id);
            blocked::invalidate_dependents(&mut state, &element_id, now);
        }

        self.publish(ChangeEvent::Element { id: element_id, action: ChangeAction::Deleted });
        Ok(())
    }

    /// Reverse a tombstone.
    pub fn restore(&self, id: &str) -> Result<Element, ElementError> {
        let now = self.clock().now_utc();
        let restored;
        {
            let mut state = self.state().lock();
            let current =
                state.element(id).ok_or_else(|| ElementError::NotFound(id.to_string()))?;
            if !current.is_deleted() {
                return Err(ElementError::InvalidState(format!("{id} is not tombstoned")));
            }
            let element_id = current.id;

            self.commit_locked(&mut state, Event::ElementRestored { id: element_id, at: now })?;
            blocked::invalidate_cascade(&mut state, element_id, now);
            blocked::invalidate_dependents(&mut state, &element_id, now);
            restored = state
                .element(id)
                .cloned()
                .ok_or_else(|| ElementError::Internal("restored element vanished".into()))?;
        }

        self.publish(ChangeEvent::Element { id: restored.id, action: ChangeAction::Restored });
        Ok(restored)
    }

    /// List matching elements, oldest first.
    pub fn list(&self, filter: &ElementFilter) -> Vec<Element> {
        let state = self.state().lock();
        let mut items: Vec<Element> =
            state.elements.values().filter(|e| filter.matches(e)).cloned().collect();
        items.sort_by(|a, b| (a.created_at, a.id.as_str()).cmp(&(b.created_at, b.id.as_str())));
        if let Some(limit) = filter.limit {
            items.truncate(limit);
        }
        items
    }

    /// List with offset pagination. `filter.limit` caps the page size.
    pub fn list_paginated(&self, filter: &ElementFilter, offset: usize) -> Page {
        let state = self.state().lock();
        let mut items: Vec<Element> =
            state.elements.values().filter(|e| filter.matches(e)).cloned().collect();
        items.sort_by(|a, b| (a.created_at, a.id.as_str()).cmp(&(b.created_at, b.id.as_str())));
        let total = items.len();
        let page: Vec<Element> = items
            .into_iter()
            .skip(offset)
            .take(filter.limit.unwrap_or(usize::MAX))
            .collect();
        Page { items: page, total, offset }
    }
}

fn validate_new(new: &NewElement) -> Result<(), ElementError> {
    if new.title.trim().is_empty() {
        return Err(ElementError::Validation("title is empty".to_string()));
    }
    match &new.body {
        ElementBody::Task(t) => {
            if !task::valid_scale(t.priority) {
                return Err(ElementError::Validation("priority out of range".to_string()));
            }
            if !task::valid_scale(t.complexity) {
                return Err(ElementError::Validation("complexity out of range".to_string()));
            }
        }
        ElementBody::Playbook(p) => {
            el_playbook::validate(p).map_err(|e| ElementError::Validation(e.to_string()))?;
        }
        _ => {}
    }
    Ok(())
}

/// Apply a patch to an element copy, enforcing kind-specific validators.
fn apply_patch(
    element: &mut Element,
    patch: &ElementPatch,
    now: DateTime<Utc>,
) -> Result<(), ElementError> {
    if let Some(title) = &patch.title {
        if title.trim().is_empty() {
            return Err(ElementError::Validation("title is empty".to_string()));
        }
        element.title = title.clone();
    }
    if let Some(tags) = &patch.tags {
        element.tags = tags.clone();
    }
    if let Some(metadata) = &patch.metadata {
        element.metadata = metadata.clone();
    }

    match &mut element.body {
        ElementBody::Task(fields) => {
            if let Some(status) = &patch.status {
                let to = TaskStatus::parse(status).ok_or_else(|| {
                    ElementError::Validation(format!("unknown task status: {status}"))
                })?;
                fields.status.check_transition(to)?;
                if fields.status == TaskStatus::Closed && to == TaskStatus::Open {
                    fields.close_reason = None;
                }
                fields.status = to;
            }
            if let Some(priority) = patch.priority {
                if !task::valid_scale(priority) {
                    return Err(ElementError::Validation("priority out of range".to_string()));
                }
                fields.priority = priority;
            }
            if let Some(complexity) = patch.complexity {
                if !task::valid_scale(complexity) {
                    return Err(ElementError::Validation("complexity out of range".to_string()));
                }
                fields.complexity = complexity;
            }
            if let Some(task_type) = patch.task_type {
                fields.task_type = task_type;
            }
            if let Some(description) = &patch.description {
                fields.description = description.clone();
            }
            if let Some(assignee) = &patch.assignee {
                fields.assignee = *assignee;
            }
            if let Some(owner) = &patch.owner {
                fields.owner = *owner;
            }
            if let Some(scheduled_for) = &patch.scheduled_for {
                fields.scheduled_for = *scheduled_for;
            }
            if let Some(deadline) = &patch.deadline {
                fields.deadline = *deadline;
            }
            if let Some(close_reason) = &patch.close_reason {
                fields.close_reason = close_reason.clone();
            }
            if let Some(ephemeral) = patch.ephemeral {
                fields.ephemeral = ephemeral;
            }
            reject_workflow_fields(patch)?;
        }
        ElementBody::Workflow(fields) => {
            if let Some(status) = &patch.status {
                let to = WorkflowStatus::parse(status).ok_or_else(|| {
                    ElementError::Validation(format!("unknown workflow status: {status}"))
                })?;
                fields.status.check_transition(to)?;
                if to == WorkflowStatus::Running && fields.started_at.is_none() {
                    fields.started_at = Some(now);
                }
                if to.is_terminal() && fields.finished_at.is_none() {
                    fields.finished_at = Some(now);
                }
                fields.status = to;
            }
            if let Some(ephemeral) = patch.ephemeral {
                fields.ephemeral = ephemeral;
            }
            if let Some(variables) = &patch.variables {
                fields.variables = variables.clone();
            }
            if let Some(failure_reason) = &patch.failure_reason {
                fields.failure_reason = failure_reason.clone();
            }
            if let Some(cancel_reason) = &patch.cancel_reason {
                fields.cancel_reason = cancel_reason.clone();
            }
            reject_task_fields(patch)?;
        }
        ElementBody::Document { content } | ElementBody::Comment { content } => {
            if let Some(next) = &patch.content {
                *content = next.clone();
            }
            if patch.status.is_some() {
                return Err(ElementError::Validation(
                    "status is not applicable to this kind".to_string(),
                ));
            }
        }
        _ => {
            if patch.status.is_some() {
                return Err(ElementError::Validation(
                    "status is not applicable to this kind".to_string(),
                ));
            }
        }
    }

    Ok(())
}

fn reject_workflow_fields(patch: &ElementPatch) -> Result<(), ElementError> {
    if patch.variables.is_some()
        || patch.failure_reason.is_some()
        || patch.cancel_reason.is_some()
    {
        return Err(ElementError::Validation(
            "workflow fields are not applicable to a task".to_string(),
        ));
    }
    Ok(())
}

fn reject_task_fields(patch: &ElementPatch) -> Result<(), ElementError> {
    if patch.priority.is_some()
        || patch.complexity.is_some()
        || patch.task_type.is_some()
        || patch.assignee.is_some()
        || patch.owner.is_some()
        || patch.scheduled_for.is_some()
        || patch.deadline.is_some()
        || patch.close_reason.is_some()
    {
        return Err(ElementError::Validation(
            "task fields are not applicable to a workflow".to_string(),
        ));
    }
    Ok(())
}
