// SPDX-License-Identifier: MIT

//! `el dep` subcommands.

use crate::client::Client;
use crate::exit_error::ExitError;
use crate::output::{short_id, table};
use clap::Subcommand;
use serde_json::{json, Value};

#[derive(Subcommand)]
pub enum DepCommand {
    /// Add an edge: source depends on target
    Add {
        source: String,
        target: String,
        /// blocks | parent-child | awaits | relates-to | ...
        #[arg(long, default_value = "blocks")]
        r#type: String,
        /// JSON gate metadata for awaits edges
        #[arg(long)]
        metadata: Option<String>,
    },
    /// Remove an edge
    Remove {
        source: String,
        target: String,
        #[arg(long, default_value = "blocks")]
        r#type: String,
    },
    /// List edges of an element (both directions)
    List { id: String },
    /// Print the dependency tree around an element
    Tree {
        id: String,
        #[arg(long, default_value_t = 3)]
        depth: usize,
    },
}

pub async fn run(cmd: DepCommand) -> Result<(), ExitError> {
    let client = Client::from_env();
    match cmd {
        DepCommand::Add { source, target, r#type, metadata } => {
            let metadata: Value = match metadata {
                Some(raw) => serde_json::from_str(&raw)
                    .map_err(|e| ExitError::new(2, format!("invalid --metadata JSON: {e}")))?,
                None => json!({}),
            };
            client
                .post(
                    "/api/dependencies",
                    json!({
                        "sourceId": source,
                        "targetId": target,
                        "type": r#type,
                        "metadata": metadata,
                    }),
                )
                .await?;
            println!("added {source} -[{t}]-> {target}", t = r#type);
            Ok(())
        }
        DepCommand::Remove { source, target, r#type } => {
            client
                .delete(&format!(
                    "/api/dependencies?sourceId={source}&targetId={target}&type={t}",
                    t = r#type
                ))
                .await?;
            println!("removed {source} -[{t}]-> {target}", t = r#type);
            Ok(())
        }
        DepCommand::List { id } => {
            let out = client.get(&format!("/api/elements/{id}/dependencies")).await?;
            let incoming = client.get(&format!("/api/elements/{id}/dependents")).await?;
            let mut rows = Vec::new();
            for dep in out.as_array().map_or(&[][..], Vec::as_slice) {
                rows.push(vec![
                    "->".to_string(),
                    dep["type"].as_str().unwrap_or("").to_string(),
                    short_id(dep["targetId"].as_str().unwrap_or(""), 12).to_string(),
                ]);
            }
            for dep in incoming.as_array().map_or(&[][..], Vec::as_slice) {
                rows.push(vec![
                    "<-".to_string(),
                    dep["type"].as_str().unwrap_or("").to_string(),
                    short_id(dep["sourceId"].as_str().unwrap_or(""), 12).to_string(),
                ]);
            }
            print!("{}", table(&["dir", "type", "element"], &rows));
            Ok(())
        }
        DepCommand::Tree { id, depth } => {
            let tree = client.get(&format!("/api/elements/{id}/tree?depth={depth}")).await?;
            print_tree(&tree, 0);
            Ok(())
        }
    }
}

fn print_tree(node: &Value, indent: usize) {
    let pad = "  ".repeat(indent);
    let title = node["element"]["title"].as_str().unwrap_or("?");
    let id = short_id(node["element"]["id"].as_str().unwrap_or(""), 12);
    let marker = if node["circular"].as_bool().unwrap_or(false) {
        " (circular reference)"
    } else {
        ""
    };
    match node["via"].as_str() {
        Some(via) => println!("{pad}[{via}] {title} {id}{marker}"),
        None => println!("{pad}{title} {id}{marker}"),
    }
    for child in node["dependencies"].as_array().map_or(&[][..], Vec::as_slice) {
        print_tree(child, indent + 1);
    }
    for child in node["dependents"].as_array().map_or(&[][..], Vec::as_slice) {
        print_tree(child, indent + 1);
    }
}
