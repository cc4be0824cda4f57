// SPDX-License-Identifier: MIT

//! Text search over elements.
//!
//! Substring match over title, tags, and task/document text, ranked by
//! recency. Semantic/hybrid ranking stays out of the engine; this is the
//! floor the HTTP surface builds on.

use super::elements::ElementFilter;
use crate::engine::Engine;
use crate::error::ElementError;
use el_core::{Clock, Element, ElementBody};

impl<C: Clock> Engine<C> {
    /// Case-insensitive substring search; newest updates first.
    pub fn search(&self, query: &str, filter: &ElementFilter) -> Result<Vec<Element>, ElementError> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Err(ElementError::Validation("empty search query".to_string()));
        }

        let state = self.state().lock();
        let mut hits: Vec<Element> = state
            .elements
            .values()
            .filter(|e| filter.matches(e) && matches_query(e, &needle))
            .cloned()
            .collect();
        hits.sort_by(|a, b| {
            (b.updated_at, a.id.as_str()).cmp(&(a.updated_at, b.id.as_str()))
        });
        if let Some(limit) = filter.limit {
            hits.truncate(limit);
        }
        Ok(hits)
    }
}

fn matches_query(element: &Element, needle: &str) -> bool {
    if element.title.to_lowercase().contains(needle) {
        return true;
    }
    if element.tags.iter().any(|t| t.to_lowercase().contains(needle)) {
        return true;
    }
    let text = match &element.body {
        ElementBody::Task(t) => t.description.as_deref(),
        ElementBody::Document { content } | ElementBody::Comment { content } => content.as_deref(),
        _ => None,
    };
    text.map(|t| t.to_lowercase().contains(needle)).unwrap_or(false)
}
