// SPDX-License-Identifier: MIT

//! Plain-text table output.

/// Render rows as aligned columns. Header first, separator, then rows.
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.len());
            }
        }
    }

    let render_row = |cells: &[String]| {
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("{:width$}", cell, width = widths.get(i).copied().unwrap_or(0)))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&render_row(
        &headers.iter().map(|h| h.to_uppercase()).collect::<Vec<_>>(),
    ));
    out.push('\n');
    for row in rows {
        out.push_str(&render_row(row));
        out.push('\n');
    }
    out
}

/// First `n` chars of an id for display.
pub fn short_id(id: &str, n: usize) -> &str {
    &id[..n.min(id.len())]
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
