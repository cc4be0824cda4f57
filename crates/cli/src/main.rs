// SPDX-License-Identifier: MIT

//! el: CLI for the Elemental workspace orchestrator.

mod client;
mod commands;
mod exit_error;
mod output;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "el", version, about = "Elemental workspace orchestrator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Initialize the workspace (.elemental, config, git checks)
    Init,
    /// Stop the daemon and remove workspace state
    Reset {
        /// Also remove the config file
        #[arg(long)]
        full: bool,
    },
    /// Task queries and lifecycle
    #[command(subcommand)]
    Task(commands::task::TaskCommand),
    /// Dependency edges
    #[command(subcommand)]
    Dep(commands::dep::DepCommand),
    /// Workflow operations
    #[command(subcommand)]
    Workflow(commands::workflow::WorkflowCommand),
    /// Entity registry
    #[command(subcommand)]
    Entity(commands::entity::EntityCommand),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Command::Init => commands::workspace::init().await,
        Command::Reset { full } => commands::workspace::reset(full).await,
        Command::Task(cmd) => commands::task::run(cmd).await,
        Command::Dep(cmd) => commands::dep::run(cmd).await,
        Command::Workflow(cmd) => commands::workflow::run(cmd).await,
        Command::Entity(cmd) => commands::entity::run(cmd).await,
    };

    if let Err(e) = result {
        eprintln!("el: {e}");
        std::process::exit(e.code);
    }
}
