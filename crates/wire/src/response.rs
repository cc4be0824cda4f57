// SPDX-License-Identifier: MIT

//! Response DTOs. Core records serialize cleanly, so most responses wrap
//! them with query-specific context only.

use el_core::{Element, ElementId, MessageRecord, SessionRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskList {
    pub tasks: Vec<Element>,
    pub total: usize,
}

/// Detail view with assignment context resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetail {
    #[serde(flatten)]
    pub element: Element,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedTaskEntry {
    pub task: Element,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_by: Option<ElementId>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PourResponse {
    pub workflow: Element,
    pub task_ids: Vec<ElementId>,
    pub skipped_steps: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    pub workflow_id: ElementId,
    pub total_tasks: usize,
    pub status_counts: BTreeMap<String, usize>,
    pub ready_tasks: Vec<ElementId>,
    pub blocked_tasks: Vec<ElementId>,
    pub completion_percentage: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowTasksResponse {
    pub workflow_id: ElementId,
    pub tasks: Vec<Element>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GcResponse {
    pub candidates: Vec<ElementId>,
    pub burned: usize,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionList {
    pub sessions: Vec<SessionRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesResponse {
    pub session_id: String,
    pub messages: Vec<MessageRecord>,
}
