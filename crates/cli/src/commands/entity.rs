// SPDX-License-Identifier: MIT

//! `el entity` subcommands.

use crate::client::Client;
use crate::exit_error::ExitError;
use crate::output::{short_id, table};
use clap::Subcommand;
use serde_json::json;

#[derive(Subcommand)]
pub enum EntityCommand {
    /// Register an entity (agent, human, or system)
    Register {
        name: String,
        #[arg(long = "type", default_value = "agent")]
        entity_type: String,
    },
    /// List registered entities
    List,
}

pub async fn run(cmd: EntityCommand) -> Result<(), ExitError> {
    let client = Client::from_env();
    match cmd {
        EntityCommand::Register { name, entity_type } => {
            let created = client
                .post(
                    "/api/entities",
                    json!({ "name": name, "entityType": entity_type }),
                )
                .await?;
            println!("registered {} as {}", created["id"].as_str().unwrap_or("?"), name);
            Ok(())
        }
        EntityCommand::List => {
            let entities = client.get("/api/entities").await?;
            let rows: Vec<Vec<String>> = entities
                .as_array()
                .map_or(&[][..], Vec::as_slice)
                .iter()
                .map(|e| {
                    vec![
                        short_id(e["id"].as_str().unwrap_or(""), 12).to_string(),
                        e["entity_type"].as_str().unwrap_or("").to_string(),
                        e["title"].as_str().unwrap_or("").to_string(),
                    ]
                })
                .collect();
            print!("{}", table(&["id", "type", "name"], &rows));
            Ok(())
        }
    }
}
