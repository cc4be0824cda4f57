// SPDX-License-Identifier: MIT

//! Shared lookup helpers for state maps.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

/// Find a value by exact key or unique key prefix.
///
/// Exact matches win; a prefix that matches more than one key returns
/// `None` (ambiguous).
pub fn find_by_prefix<'a, K, V>(map: &'a HashMap<K, V>, id: &str) -> Option<&'a V>
where
    K: Borrow<str> + Eq + Hash,
{
    if let Some(v) = map.get(id) {
        return Some(v);
    }
    let mut hit = None;
    for (key, value) in map {
        if key.borrow().starts_with(id) {
            if hit.is_some() {
                return None;
            }
            hit = Some(value);
        }
    }
    hit
}
