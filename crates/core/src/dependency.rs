// SPDX-License-Identifier: MIT

//! Dependency edges between elements.
//!
//! Edge types partition into three families; only the blocking family
//! (`blocks`, `parent-child`, `awaits`) feeds the blocked cache. `awaits`
//! edges carry a [`Gate`] — a discriminated union validated at insertion,
//! never a free-form JSON blob.

use crate::element::{ElementId, EntityId, Metadata};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyType {
    // Blocking family. Declaration order doubles as the deterministic
    // edge-evaluation order in the blocked cache.
    Blocks,
    ParentChild,
    Awaits,
    // Associative family
    RelatesTo,
    References,
    Supersedes,
    Duplicates,
    CausedBy,
    Validates,
    // Attribution / threading family
    AuthoredBy,
    AssignedTo,
    ApprovedBy,
    RepliesTo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyFamily {
    Blocking,
    Associative,
    Attribution,
}

impl DependencyType {
    pub fn family(self) -> DependencyFamily {
        use DependencyType::*;
        match self {
            Blocks | ParentChild | Awaits => DependencyFamily::Blocking,
            RelatesTo | References | Supersedes | Duplicates | CausedBy | Validates => {
                DependencyFamily::Associative
            }
            AuthoredBy | AssignedTo | ApprovedBy | RepliesTo => DependencyFamily::Attribution,
        }
    }

    pub fn is_blocking(self) -> bool {
        self.family() == DependencyFamily::Blocking
    }

    pub fn as_str(self) -> &'static str {
        use DependencyType::*;
        match self {
            Blocks => "blocks",
            ParentChild => "parent-child",
            Awaits => "awaits",
            RelatesTo => "relates-to",
            References => "references",
            Supersedes => "supersedes",
            Duplicates => "duplicates",
            CausedBy => "caused-by",
            Validates => "validates",
            AuthoredBy => "authored-by",
            AssignedTo => "assigned-to",
            ApprovedBy => "approved-by",
            RepliesTo => "replies-to",
        }
    }

    pub fn parse(s: &str) -> Option<DependencyType> {
        use DependencyType::*;
        Some(match s {
            "blocks" => Blocks,
            "parent-child" => ParentChild,
            "awaits" => Awaits,
            "relates-to" => RelatesTo,
            "references" => References,
            "supersedes" => Supersedes,
            "duplicates" => Duplicates,
            "caused-by" => CausedBy,
            "validates" => Validates,
            "authored-by" => AuthoredBy,
            "assigned-to" => AssignedTo,
            "approved-by" => ApprovedBy,
            "replies-to" => RepliesTo,
            _ => return None,
        })
    }
}

impl std::fmt::Display for DependencyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gate discriminant, used in error reporting and DTOs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateKind {
    Timer,
    Approval,
    External,
    Webhook,
}

crate::simple_display! {
    GateKind {
        Timer => "timer",
        Approval => "approval",
        External => "external",
        Webhook => "webhook",
    }
}

/// Satisfaction condition of an `awaits` edge.
///
/// `external` and `webhook` gates are never satisfied by inspection —
/// releasing one requires a mutation that rewrites the edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "gate", rename_all = "snake_case")]
pub enum Gate {
    Timer {
        #[serde(rename = "waitUntil")]
        wait_until: DateTime<Utc>,
    },
    Approval {
        #[serde(default, rename = "requiredApprovers")]
        required_approvers: Vec<EntityId>,
        #[serde(default, rename = "currentApprovers")]
        current_approvers: Vec<EntityId>,
        /// Overrides `required_approvers.len()` when present.
        #[serde(default, rename = "approvalCount", skip_serializing_if = "Option::is_none")]
        approval_count: Option<usize>,
    },
    External,
    Webhook,
}

impl Gate {
    pub fn kind(&self) -> GateKind {
        match self {
            Gate::Timer { .. } => GateKind::Timer,
            Gate::Approval { .. } => GateKind::Approval,
            Gate::External => GateKind::External,
            Gate::Webhook => GateKind::Webhook,
        }
    }

    /// Whether the gate is open at `now`.
    pub fn is_satisfied(&self, now: DateTime<Utc>) -> bool {
        match self {
            Gate::Timer { wait_until } => now >= *wait_until,
            Gate::Approval { required_approvers, current_approvers, approval_count } => {
                let needed = approval_count.unwrap_or(required_approvers.len());
                current_approvers.len() >= needed
            }
            Gate::External | Gate::Webhook => false,
        }
    }

    /// Parse and validate gate metadata from a raw JSON object.
    ///
    /// Invalid metadata is an insertion error; edges already persisted with
    /// unreadable gates are treated as blocking by the cache (fail-safe).
    pub fn from_metadata(metadata: &Metadata) -> Result<Gate, GateError> {
        let value = serde_json::Value::Object(metadata.clone());
        serde_json::from_value(value).map_err(|e| GateError::Invalid(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("invalid awaits gate metadata: {0}")]
    Invalid(String),
    #[error("awaits dependency requires gate metadata")]
    Missing,
}

/// Uniqueness key for an edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DepKey {
    pub source_id: ElementId,
    pub target_id: ElementId,
    pub dep_type: DependencyType,
}

/// A directed, typed relationship between two elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    pub source_id: ElementId,
    pub target_id: ElementId,
    #[serde(rename = "type")]
    pub dep_type: DependencyType,
    /// Present iff `dep_type` is `awaits`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate: Option<Gate>,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
    pub created_by: EntityId,
    pub created_at: DateTime<Utc>,
}

impl Dependency {
    pub fn key(&self) -> DepKey {
        DepKey {
            source_id: self.source_id,
            target_id: self.target_id,
            dep_type: self.dep_type,
        }
    }
}

#[cfg(test)]
#[path = "dependency_tests.rs"]
mod tests;
