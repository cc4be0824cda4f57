// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn columns_align_to_widest_cell() {
    let rows = vec![
        vec!["el-1".to_string(), "open".to_string()],
        vec!["el-22222".to_string(), "closed".to_string()],
    ];
    let out = table(&["id", "status"], &rows);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "ID        STATUS");
    assert_eq!(lines[1], "el-1      open");
    assert_eq!(lines[2], "el-22222  closed");
}

#[test]
fn empty_rows_render_header_only() {
    let out = table(&["id"], &[]);
    assert_eq!(out, "ID\n");
}

#[test]
fn short_id_truncates() {
    assert_eq!(short_id("el-abcdefghij", 6), "el-abc");
    assert_eq!(short_id("el", 6), "el");
}
