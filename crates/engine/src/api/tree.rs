// SPDX-License-Identifier: MIT

//! Dependency tree traversal.
//!
//! Walks both edge directions from a root, bounded by depth. The visited
//! set travels by value down each branch, so a revisit becomes a synthetic
//! "circular reference" leaf instead of recursing forever (associative
//! edges may legally form cycles).

use crate::engine::Engine;
use crate::error::ElementError;
use el_core::{Clock, DependencyType, Element, ElementId};
use el_store::MaterializedState;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyTreeNode {
    pub element: Element,
    /// Edge that led here (absent on the root).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub via: Option<DependencyType>,
    /// Outgoing edges (what this element depends on).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<DependencyTreeNode>,
    /// Incoming edges (what depends on this element).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependents: Vec<DependencyTreeNode>,
    /// Marks a node already seen on this branch; children are elided.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub circular: bool,
    /// Total nodes in this subtree (root reports the whole tree).
    pub node_count: usize,
    pub depth_down: usize,
    pub depth_up: usize,
}

impl<C: Clock> Engine<C> {
    /// Build the dependency tree around `root`, `depth` hops each way.
    pub fn get_dependency_tree(
        &self,
        root: &str,
        depth: usize,
    ) -> Result<DependencyTreeNode, ElementError> {
        let state = self.state().lock();
        let element = state
            .element(root)
            .filter(|e| !e.is_deleted())
            .cloned()
            .ok_or_else(|| ElementError::NotFound(root.to_string()))?;

        let mut visited = HashSet::new();
        visited.insert(element.id);
        Ok(build_node(&state, element, None, depth, depth, &visited))
    }
}

fn build_node(
    state: &MaterializedState,
    element: Element,
    via: Option<DependencyType>,
    down_budget: usize,
    up_budget: usize,
    visited: &HashSet<ElementId>,
) -> DependencyTreeNode {
    let id = element.id;
    let mut node = DependencyTreeNode {
        element,
        via,
        dependencies: Vec::new(),
        dependents: Vec::new(),
        circular: false,
        node_count: 1,
        depth_down: 0,
        depth_up: 0,
    };

    if down_budget > 0 {
        for dep in state.deps_from(id.as_str()) {
            let Some(child) = state.element(dep.target_id.as_str()) else {
                continue;
            };
            if child.is_deleted() {
                continue;
            }
            let next = descend(state, child.clone(), dep.dep_type, down_budget - 1, 0, visited);
            node.node_count += next.node_count;
            node.depth_down = node.depth_down.max(next.depth_down + 1);
            node.dependencies.push(next);
        }
    }

    if up_budget > 0 {
        for dep in state.deps_to(id.as_str()) {
            let Some(parent) = state.element(dep.source_id.as_str()) else {
                continue;
            };
            if parent.is_deleted() {
                continue;
            }
            let next = descend(state, parent.clone(), dep.dep_type, 0, up_budget - 1, visited);
            node.node_count += next.node_count;
            node.depth_up = node.depth_up.max(next.depth_up + 1);
            node.dependents.push(next);
        }
    }

    node
}

fn descend(
    state: &MaterializedState,
    element: Element,
    via: DependencyType,
    down_budget: usize,
    up_budget: usize,
    visited: &HashSet<ElementId>,
) -> DependencyTreeNode {
    if visited.contains(&element.id) {
        // Circular reference leaf: keep the element, stop the walk.
        return DependencyTreeNode {
            element,
            via: Some(via),
            dependencies: Vec::new(),
            dependents: Vec::new(),
            circular: true,
            node_count: 1,
            depth_down: 0,
            depth_up: 0,
        };
    }
    // By-value copy per branch: a diamond is visited once per path, a
    // cycle exactly once.
    let mut branch = visited.clone();
    branch.insert(element.id);
    build_node(state, element, Some(via), down_budget, up_budget, &branch)
}

#[cfg(test)]
#[path = "tree_tests.rs"]
mod tests;
