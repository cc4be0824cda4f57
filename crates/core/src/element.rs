// SPDX-License-Identifier: MIT

//! The uniform element record.
//!
//! Every persisted object — task, workflow, playbook, document, entity —
//! is an [`Element`]: shared envelope fields plus a kind-specific body.
//! Soft deletion is an envelope concern (`deleted_at`), orthogonal to the
//! kind-specific status enums.

use crate::playbook::PlaybookFields;
use crate::task::TaskFields;
use crate::workflow::WorkflowFields;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

crate::define_id! {
    /// Unique identifier for an element, stable across renames.
    pub struct ElementId("el-");
}

/// An [`ElementId`] whose element is of kind `entity`.
///
/// Used in actor fields (`created_by`, `assignee`, approvers). The daemon
/// validates entity-ness at the API boundary; the type is an alias so actor
/// fields stay plain element references in storage.
pub type EntityId = ElementId;

/// Well-known entity ID used as the actor for bootstrap mutations.
pub const SYSTEM_ENTITY: &str = "el-0000000000000000000";

/// JSON object used for free-form element and edge metadata.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Discriminant of an element's kind-specific body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Task,
    Workflow,
    Playbook,
    Document,
    Entity,
    Library,
    Channel,
    Notification,
    Comment,
}

crate::simple_display! {
    ElementKind {
        Task => "task",
        Workflow => "workflow",
        Playbook => "playbook",
        Document => "document",
        Entity => "entity",
        Library => "library",
        Channel => "channel",
        Notification => "notification",
        Comment => "comment",
    }
}

/// What kind of actor an `entity` element represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Agent,
    Human,
    System,
}

crate::simple_display! {
    EntityType {
        Agent => "agent",
        Human => "human",
        System => "system",
    }
}

/// Kind-specific element fields, tagged by `kind` in serialized form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ElementBody {
    Task(TaskFields),
    Workflow(WorkflowFields),
    Playbook(PlaybookFields),
    Document {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
    },
    Entity {
        entity_type: EntityType,
    },
    Library,
    Channel,
    Notification,
    Comment {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
    },
}

impl ElementBody {
    pub fn kind(&self) -> ElementKind {
        match self {
            ElementBody::Task(_) => ElementKind::Task,
            ElementBody::Workflow(_) => ElementKind::Workflow,
            ElementBody::Playbook(_) => ElementKind::Playbook,
            ElementBody::Document { .. } => ElementKind::Document,
            ElementBody::Entity { .. } => ElementKind::Entity,
            ElementBody::Library => ElementKind::Library,
            ElementBody::Channel => ElementKind::Channel,
            ElementBody::Notification => ElementKind::Notification,
            ElementBody::Comment { .. } => ElementKind::Comment,
        }
    }
}

/// The uniform persistent record.
///
/// `version` strictly increases on every persisted mutation;
/// `deleted_at` is the tombstone marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    pub title: String,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    pub version: u64,
    #[serde(flatten)]
    pub body: ElementBody,
}

impl Element {
    /// Create a fresh element at version 1.
    pub fn new(
        id: ElementId,
        title: impl Into<String>,
        created_by: EntityId,
        at: DateTime<Utc>,
        body: ElementBody,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            tags: BTreeSet::new(),
            metadata: Metadata::new(),
            created_at: at,
            updated_at: at,
            created_by,
            deleted_at: None,
            version: 1,
            body,
        }
    }

    pub fn kind(&self) -> ElementKind {
        self.body.kind()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Whether this element counts as completed for blocking purposes.
    ///
    /// Completed statuses are closed (tasks), completed (workflows), and
    /// tombstone. Kinds without a status never complete — a blocking edge
    /// onto them holds until the target is tombstoned.
    pub fn is_blocking_complete(&self) -> bool {
        if self.is_deleted() {
            return true;
        }
        match &self.body {
            ElementBody::Task(t) => t.status == crate::task::TaskStatus::Closed,
            ElementBody::Workflow(w) => w.status == crate::workflow::WorkflowStatus::Completed,
            _ => false,
        }
    }

    pub fn task(&self) -> Option<&TaskFields> {
        match &self.body {
            ElementBody::Task(t) => Some(t),
            _ => None,
        }
    }

    pub fn task_mut(&mut self) -> Option<&mut TaskFields> {
        match &mut self.body {
            ElementBody::Task(t) => Some(t),
            _ => None,
        }
    }

    pub fn workflow(&self) -> Option<&WorkflowFields> {
        match &self.body {
            ElementBody::Workflow(w) => Some(w),
            _ => None,
        }
    }

    pub fn workflow_mut(&mut self) -> Option<&mut WorkflowFields> {
        match &mut self.body {
            ElementBody::Workflow(w) => Some(w),
            _ => None,
        }
    }

    pub fn playbook(&self) -> Option<&PlaybookFields> {
        match &self.body {
            ElementBody::Playbook(p) => Some(p),
            _ => None,
        }
    }

    pub fn entity_type(&self) -> Option<EntityType> {
        match &self.body {
            ElementBody::Entity { entity_type } => Some(*entity_type),
            _ => None,
        }
    }

    /// Status label for DTOs; soft-deleted elements report `tombstone`
    /// regardless of their kind-specific status.
    pub fn status_label(&self) -> &'static str {
        if self.is_deleted() {
            return "tombstone";
        }
        match &self.body {
            ElementBody::Task(t) => t.status.as_str(),
            ElementBody::Workflow(w) => w.status.as_str(),
            _ => "active",
        }
    }
}

#[cfg(test)]
#[path = "element_tests.rs"]
mod tests;
