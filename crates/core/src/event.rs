// SPDX-License-Identifier: MIT

//! WAL event facts.
//!
//! Mutations are expressed as events appended to the write-ahead log and
//! applied to the materialized state. Record-carrying events hold the full
//! post-mutation record, which keeps replay idempotent by construction:
//! applying the same event twice assigns the same state.
//!
//! Serializes with `{"type": "domain:verb", ...fields}`; unknown type tags
//! deserialize to `Custom` so newer logs replay on older binaries.

use crate::dependency::{Dependency, DependencyType};
use crate::element::{Element, ElementId};
use crate::message::MessageRecord;
use crate::session::{SessionId, SessionRecord};
use crate::worktree::WorktreeRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    // -- element --
    #[serde(rename = "element:created")]
    ElementCreated { element: Element },

    /// Full post-update record; `version` already bumped by the API layer.
    #[serde(rename = "element:updated")]
    ElementUpdated { element: Element },

    /// Soft delete (tombstone).
    #[serde(rename = "element:deleted")]
    ElementDeleted { id: ElementId, at: DateTime<Utc> },

    /// Explicit tombstone reversal.
    #[serde(rename = "element:restored")]
    ElementRestored { id: ElementId, at: DateTime<Utc> },

    /// Hard delete (burn); removes the element and every touching edge.
    #[serde(rename = "element:purged")]
    ElementPurged { id: ElementId },

    // -- dependency --
    #[serde(rename = "dependency:added")]
    DependencyAdded { dependency: Dependency },

    #[serde(rename = "dependency:removed")]
    DependencyRemoved {
        source_id: ElementId,
        target_id: ElementId,
        dep_type: DependencyType,
    },

    // -- session --
    #[serde(rename = "session:started")]
    SessionStarted { record: SessionRecord },

    /// Full post-mutation record (status moves, cookie capture, exit).
    #[serde(rename = "session:updated")]
    SessionUpdated { record: SessionRecord },

    // -- message --
    #[serde(rename = "message:appended")]
    MessageAppended { message: MessageRecord },

    // -- worktree --
    #[serde(rename = "worktree:created")]
    WorktreeCreated { record: WorktreeRecord },

    #[serde(rename = "worktree:updated")]
    WorktreeUpdated { record: WorktreeRecord },

    #[serde(rename = "worktree:removed")]
    WorktreeRemoved { path: PathBuf },

    /// Catch-all for unknown event types (extensibility)
    #[serde(other, skip_serializing)]
    Custom,
}

impl Event {
    /// Element id this event touches, when there is exactly one.
    pub fn element_id(&self) -> Option<ElementId> {
        match self {
            Event::ElementCreated { element } | Event::ElementUpdated { element } => {
                Some(element.id)
            }
            Event::ElementDeleted { id, .. }
            | Event::ElementRestored { id, .. }
            | Event::ElementPurged { id } => Some(*id),
            Event::DependencyAdded { dependency } => Some(dependency.source_id),
            Event::DependencyRemoved { source_id, .. } => Some(*source_id),
            _ => None,
        }
    }

    /// Session id this event touches, if any.
    pub fn session_id(&self) -> Option<SessionId> {
        match self {
            Event::SessionStarted { record } | Event::SessionUpdated { record } => Some(record.id),
            Event::MessageAppended { message } => Some(message.session_id),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
