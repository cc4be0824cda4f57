// SPDX-License-Identifier: MIT

//! CLI surface smoke tests.

use assert_cmd::Command;

#[test]
fn help_lists_required_nouns() {
    let output = Command::cargo_bin("el").unwrap().arg("--help").assert().success();
    let stdout = String::from_utf8_lossy(&output.get_output().stdout).to_string();
    for noun in ["task", "dep", "workflow", "entity", "init", "reset"] {
        assert!(stdout.contains(noun), "help is missing {noun}");
    }
}

#[test]
fn unknown_subcommand_exits_with_usage_error() {
    Command::cargo_bin("el").unwrap().arg("frobnicate").assert().code(2);
}

#[test]
fn task_help_lists_lifecycle_verbs() {
    let output =
        Command::cargo_bin("el").unwrap().args(["task", "--help"]).assert().success();
    let stdout = String::from_utf8_lossy(&output.get_output().stdout).to_string();
    for verb in ["ready", "blocked", "close", "reopen", "assign", "defer", "undefer"] {
        assert!(stdout.contains(verb), "task help is missing {verb}");
    }
}
