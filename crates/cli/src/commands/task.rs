// SPDX-License-Identifier: MIT

//! `el task` subcommands.

use crate::client::Client;
use crate::exit_error::ExitError;
use crate::output::{short_id, table};
use clap::Subcommand;
use serde_json::{json, Value};

#[derive(Subcommand)]
pub enum TaskCommand {
    /// Tasks that are actionable now
    Ready {
        #[arg(long)]
        assignee: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Tasks that cannot proceed, with the cause
    Blocked {
        #[arg(long)]
        assignee: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Close a task
    Close {
        id: String,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Reopen a closed task
    Reopen { id: String },
    /// Assign (or with --clear, unassign) a task
    Assign {
        id: String,
        entity: Option<String>,
        #[arg(long)]
        clear: bool,
    },
    /// Park a task until later
    Defer {
        id: String,
        /// RFC3339 timestamp to resurface at
        #[arg(long)]
        until: Option<String>,
    },
    /// Return a deferred task to the open pool
    Undefer { id: String },
}

pub async fn run(cmd: TaskCommand) -> Result<(), ExitError> {
    let client = Client::from_env();
    match cmd {
        TaskCommand::Ready { assignee, limit } => {
            let query = list_query(assignee, limit);
            let body = client.get(&format!("/api/tasks/ready{query}")).await?;
            print_task_table(body["tasks"].as_array().map_or(&[][..], Vec::as_slice));
            Ok(())
        }
        TaskCommand::Blocked { assignee, limit } => {
            let query = list_query(assignee, limit);
            let body = client.get(&format!("/api/tasks/blocked{query}")).await?;
            let rows: Vec<Vec<String>> = body
                .as_array()
                .map_or(&[][..], Vec::as_slice)
                .iter()
                .map(|entry| {
                    vec![
                        short_id(entry["task"]["id"].as_str().unwrap_or(""), 12).to_string(),
                        entry["task"]["title"].as_str().unwrap_or("").to_string(),
                        entry["reason"].as_str().unwrap_or("").to_string(),
                    ]
                })
                .collect();
            print!("{}", table(&["id", "title", "reason"], &rows));
            Ok(())
        }
        TaskCommand::Close { id, reason } => {
            let mut body = json!({ "status": "closed" });
            if let Some(reason) = reason {
                body["closeReason"] = json!(reason);
            }
            client.patch(&format!("/api/tasks/{id}"), body).await?;
            println!("closed {id}");
            Ok(())
        }
        TaskCommand::Reopen { id } => {
            client.patch(&format!("/api/tasks/{id}"), json!({ "status": "open" })).await?;
            println!("reopened {id}");
            Ok(())
        }
        TaskCommand::Assign { id, entity, clear } => {
            let assignee = match (&entity, clear) {
                (Some(entity), false) => json!(entity),
                (None, true) => Value::Null,
                _ => {
                    return Err(ExitError::new(2, "pass an entity id or --clear"));
                }
            };
            client
                .patch(&format!("/api/tasks/{id}"), json!({ "assignee": assignee }))
                .await?;
            println!("assigned {id}");
            Ok(())
        }
        TaskCommand::Defer { id, until } => {
            let mut body = json!({ "status": "deferred" });
            if let Some(until) = until {
                body["scheduledFor"] = json!(until);
            }
            client.patch(&format!("/api/tasks/{id}"), body).await?;
            println!("deferred {id}");
            Ok(())
        }
        TaskCommand::Undefer { id } => {
            client
                .patch(
                    &format!("/api/tasks/{id}"),
                    json!({ "status": "open", "scheduledFor": null }),
                )
                .await?;
            println!("undeferred {id}");
            Ok(())
        }
    }
}

fn list_query(assignee: Option<String>, limit: Option<usize>) -> String {
    let mut parts = Vec::new();
    if let Some(assignee) = assignee {
        parts.push(format!("assignee={assignee}"));
    }
    if let Some(limit) = limit {
        parts.push(format!("limit={limit}"));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!("?{}", parts.join("&"))
    }
}

fn print_task_table(tasks: &[Value]) {
    let rows: Vec<Vec<String>> = tasks
        .iter()
        .map(|t| {
            vec![
                short_id(t["id"].as_str().unwrap_or(""), 12).to_string(),
                t["status"].as_str().unwrap_or("").to_string(),
                t["priority"].as_u64().map(|p| p.to_string()).unwrap_or_default(),
                t["title"].as_str().unwrap_or("").to_string(),
            ]
        })
        .collect();
    print!("{}", table(&["id", "status", "pri", "title"], &rows));
}
