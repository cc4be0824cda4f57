// SPDX-License-Identifier: MIT

//! Template variable interpolation.

use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Regex pattern for {{variable_name}}
// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
static VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([a-zA-Z_][a-zA-Z0-9_]*)\s*\}\}")
        .expect("constant regex pattern is valid")
});

/// Interpolate `{{name}}` placeholders with values from the vars map.
///
/// Strings substitute verbatim; numbers, booleans, and null use their JSON
/// text. Unknown placeholders are left as-is so typos stay visible in the
/// rendered output.
pub fn render(template: &str, vars: &HashMap<String, Value>) -> String {
    VAR_PATTERN
        .replace_all(template, |caps: &regex::Captures| {
            let name = &caps[1];
            match vars.get(name) {
                Some(Value::String(s)) => s.clone(),
                Some(value) => value.to_string(),
                None => caps[0].to_string(),
            }
        })
        .to_string()
}

/// Truthiness of a rendered condition.
///
/// Falsy: empty, `false`, `0`, `null`, `undefined` (case-insensitive,
/// whitespace-trimmed). Everything else is truthy.
pub fn is_truthy(rendered: &str) -> bool {
    let v = rendered.trim();
    !(v.is_empty()
        || v.eq_ignore_ascii_case("false")
        || v == "0"
        || v.eq_ignore_ascii_case("null")
        || v.eq_ignore_ascii_case("undefined"))
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;
