// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # tempoftp CLI
//!
//! The `tempoftp` binary runs the provisioning daemon and ships the client
//! and operator tooling around it.
//!
//! ## Commands
//!
//! - `tempoftp serve` - run the provisioning daemon
//! - `tempoftp transfer create|status` - submit and poll requests over HTTP
//! - `tempoftp account create|set-password|inspect` - direct account-directory
//!   administration, bypassing the orchestrator

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{AccountCommand, TransferCommand};

/// Short-lived FTP transfer-account provisioning
#[derive(Parser)]
#[command(name = "tempoftp")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Daemon API base URL used by client commands
    #[arg(
        long,
        global = true,
        env = "TEMPOFTP_API_URL",
        default_value = "http://127.0.0.1:9043"
    )]
    api_url: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "TEMPOFTP_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the provisioning daemon
    Serve {
        /// Listen address
        #[arg(long, env = "TEMPOFTP_HOST", default_value = "0.0.0.0")]
        host: String,

        /// Listen port
        #[arg(long, env = "TEMPOFTP_PORT", default_value = "9043")]
        port: u16,
    },

    /// Client operations against a running daemon
    Transfer {
        #[command(subcommand)]
        command: TransferCommand,
    },

    /// Direct account-directory administration
    Account {
        #[command(subcommand)]
        command: AccountCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Commands::Serve { host, port } => commands::serve::run(&host, port).await,
        Commands::Transfer { command } => command.run(&cli.api_url).await,
        Commands::Account { command } => command.run().await,
    }
}

fn init_tracing(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
