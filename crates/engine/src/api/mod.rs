// SPDX-License-Identifier: MIT

//! Element API: CRUD, listing, search, and dependency edges.

mod deps;
mod elements;
mod search;
mod tree;

pub use elements::{ElementFilter, ElementPatch, NewElement, Page};
pub use tree::DependencyTreeNode;
