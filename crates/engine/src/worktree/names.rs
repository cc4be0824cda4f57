// SPDX-License-Identifier: MIT

//! Deterministic worktree naming.

/// Where managed worktrees live, relative to the repository root.
/// Must stay inside `.gitignore` (init enforces this).
pub const WORKTREES_DIR: &str = ".elemental/.worktrees";

const SLUG_MAX: usize = 40;

/// Slugify a title for branch and path components.
///
/// Lowercase, non-alphanumerics collapse to single hyphens, trimmed,
/// truncated to 40 chars.
pub fn slug(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut last_was_hyphen = false;
    for ch in title.to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
            last_was_hyphen = false;
        } else if !last_was_hyphen && !out.is_empty() {
            out.push('-');
            last_was_hyphen = true;
        }
    }
    let trimmed = out.trim_matches('-');
    let mut result = trimmed.to_string();
    if result.len() > SLUG_MAX {
        result.truncate(SLUG_MAX);
        let retrimmed = result.trim_end_matches('-');
        if retrimmed.len() != result.len() {
            result = retrimmed.to_string();
        }
    }
    result
}

/// Sanitize a name for use in git refs and paths: lowercase, anything
/// outside `[a-z0-9-]` becomes `-`.
pub fn safe(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .collect()
}

/// `agent/{agent}/{task_id}[-{slug}]`
pub fn branch_name(agent_name: &str, task_id: &str, title: Option<&str>) -> String {
    let slugged = title.map(slug).unwrap_or_default();
    if slugged.is_empty() {
        format!("agent/{}/{}", safe(agent_name), task_id)
    } else {
        format!("agent/{}/{}-{}", safe(agent_name), task_id, slugged)
    }
}

/// `.elemental/.worktrees/{agent}[-{slug}]`
pub fn relative_path(agent_name: &str, title: Option<&str>) -> String {
    let slugged = title.map(slug).unwrap_or_default();
    if slugged.is_empty() {
        format!("{WORKTREES_DIR}/{}", safe(agent_name))
    } else {
        format!("{WORKTREES_DIR}/{}-{}", safe(agent_name), slugged)
    }
}

#[cfg(test)]
#[path = "names_tests.rs"]
mod tests;
