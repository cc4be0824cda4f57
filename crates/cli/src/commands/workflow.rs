// SPDX-License-Identifier: MIT

//! `el workflow` subcommands.

use crate::client::Client;
use crate::exit_error::ExitError;
use crate::output::{short_id, table};
use clap::Subcommand;
use serde_json::{json, Map, Value};

#[derive(Subcommand)]
pub enum WorkflowCommand {
    /// Instantiate a playbook into a workflow + tasks
    Pour {
        /// Playbook name or element id
        playbook: String,
        /// Variables as key=value (value parsed as JSON, else string)
        #[arg(long = "var", value_name = "KEY=VALUE")]
        vars: Vec<String>,
        /// Keep the workflow after GC age (default workflows are ephemeral)
        #[arg(long)]
        durable: bool,
        #[arg(long)]
        title: Option<String>,
    },
    /// List workflows
    List,
    /// Show one workflow
    Show { id: String },
    /// List a workflow's tasks
    Tasks { id: String },
    /// Progress summary
    Progress { id: String },
    /// Hard-delete an ephemeral workflow and its tasks
    Burn { id: String },
    /// Make an ephemeral workflow durable
    Squash { id: String },
    /// Collect expired ephemeral workflows
    Gc {
        #[arg(long)]
        max_age_ms: Option<i64>,
        #[arg(long)]
        dry_run: bool,
    },
}

pub async fn run(cmd: WorkflowCommand) -> Result<(), ExitError> {
    let client = Client::from_env();
    match cmd {
        WorkflowCommand::Pour { playbook, vars, durable, title } => {
            let variables = parse_vars(&vars)?;
            let mut body = json!({
                "playbook": playbook,
                "variables": variables,
                "ephemeral": !durable,
            });
            if let Some(title) = title {
                body["title"] = json!(title);
            }
            let poured = client.post("/api/workflows/pour", body).await?;
            println!(
                "poured {} ({} tasks, {} skipped)",
                poured["workflow"]["id"].as_str().unwrap_or("?"),
                poured["taskIds"].as_array().map(Vec::len).unwrap_or(0),
                poured["skippedSteps"].as_array().map(Vec::len).unwrap_or(0),
            );
            Ok(())
        }
        WorkflowCommand::List => {
            let workflows = client.get("/api/workflows").await?;
            let rows: Vec<Vec<String>> = workflows
                .as_array()
                .map_or(&[][..], Vec::as_slice)
                .iter()
                .map(|w| {
                    vec![
                        short_id(w["id"].as_str().unwrap_or(""), 12).to_string(),
                        w["status"].as_str().unwrap_or("").to_string(),
                        w["ephemeral"].as_bool().unwrap_or(false).to_string(),
                        w["title"].as_str().unwrap_or("").to_string(),
                    ]
                })
                .collect();
            print!("{}", table(&["id", "status", "ephemeral", "title"], &rows));
            Ok(())
        }
        WorkflowCommand::Show { id } => {
            let workflow = client.get(&format!("/api/workflows/{id}")).await?;
            println!("{}", serde_json::to_string_pretty(&workflow).unwrap_or_default());
            Ok(())
        }
        WorkflowCommand::Tasks { id } => {
            let body = client.get(&format!("/api/workflows/{id}/tasks")).await?;
            let rows: Vec<Vec<String>> = body["tasks"]
                .as_array()
                .map_or(&[][..], Vec::as_slice)
                .iter()
                .map(|t| {
                    vec![
                        short_id(t["id"].as_str().unwrap_or(""), 12).to_string(),
                        t["status"].as_str().unwrap_or("").to_string(),
                        t["title"].as_str().unwrap_or("").to_string(),
                    ]
                })
                .collect();
            print!("{}", table(&["id", "status", "title"], &rows));
            Ok(())
        }
        WorkflowCommand::Progress { id } => {
            let progress = client.get(&format!("/api/workflows/{id}/progress")).await?;
            println!(
                "{}% complete — {} tasks, {} ready, {} blocked",
                progress["completionPercentage"].as_u64().unwrap_or(0),
                progress["totalTasks"].as_u64().unwrap_or(0),
                progress["readyTasks"].as_array().map(Vec::len).unwrap_or(0),
                progress["blockedTasks"].as_array().map(Vec::len).unwrap_or(0),
            );
            Ok(())
        }
        WorkflowCommand::Burn { id } => {
            let burned = client.post(&format!("/api/workflows/{id}/burn"), json!({})).await?;
            println!(
                "burned {} elements",
                burned["burned"].as_array().map(Vec::len).unwrap_or(0)
            );
            Ok(())
        }
        WorkflowCommand::Squash { id } => {
            client.post(&format!("/api/workflows/{id}/squash"), json!({})).await?;
            println!("squashed {id}");
            Ok(())
        }
        WorkflowCommand::Gc { max_age_ms, dry_run } => {
            let mut body = json!({ "dryRun": dry_run });
            if let Some(age) = max_age_ms {
                body["maxAgeMs"] = json!(age);
            }
            let report = client.post("/api/workflows/gc", body).await?;
            let candidates = report["candidates"].as_array().map(Vec::len).unwrap_or(0);
            if dry_run {
                println!("{candidates} workflow(s) eligible");
            } else {
                println!("burned {} workflow(s)", report["burned"].as_u64().unwrap_or(0));
            }
            Ok(())
        }
    }
}

/// Parse `key=value` pairs; values try JSON first so `--var ship=true`
/// arrives as a boolean.
fn parse_vars(pairs: &[String]) -> Result<Map<String, Value>, ExitError> {
    let mut out = Map::new();
    for pair in pairs {
        let (key, raw) = pair
            .split_once('=')
            .ok_or_else(|| ExitError::new(2, format!("expected KEY=VALUE, got {pair:?}")))?;
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        out.insert(key.to_string(), value);
    }
    Ok(out)
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
