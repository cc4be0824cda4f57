// SPDX-License-Identifier: MIT

//! Stored record types that are not elements.

use el_core::ElementId;
use serde::{Deserialize, Serialize};

/// One row of the blocked cache: why an element is not ready.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedEntry {
    pub blocked_by: ElementId,
    pub reason: String,
}
