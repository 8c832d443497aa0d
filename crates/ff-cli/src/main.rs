// SPDX-License-Identifier: MIT

//! `ffoundry`: the operator-facing entrypoint for the build orchestration
//! service — start it, migrate its database, or poll a running instance.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ffoundry", version, about = "Embedded firmware build orchestration service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP/WebSocket server until interrupted
    Serve,
    /// Apply pending database migrations and exit
    Migrate {
        /// Database connection string; defaults to `DATABASE_URL`
        #[arg(long, env = "DATABASE_URL", default_value = "sqlite://ffoundry.db")]
        database_url: String,
    },
    /// Query a running instance's `/api/status`
    Status {
        /// Base URL of the running instance
        #[arg(long, default_value = "http://127.0.0.1:8080")]
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Serve => commands::serve::run().await,
        Command::Migrate { database_url } => commands::migrate::run(&database_url).await,
        Command::Status { url } => commands::status::run(&url).await,
    }
}
