// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # AEGIS Fleet Gateway CLI
//!
//! The `fleetgate` binary runs the two fleet-gateway roles and their
//! supporting utilities.
//!
//! ## Commands
//!
//! - `fleetgate agent` - Run the agent daemon (trust gateway + supervisor API)
//! - `fleetgate manager` - Run the manager daemon (registry + dispatcher)
//! - `fleetgate config show|validate|generate` - Configuration management
//! - `fleetgate key show` - Inspect the persisted API credential

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

mod commands;

use commands::{ConfigCommand, KeyCommand};

/// AEGIS Fleet Gateway - authenticated lifecycle control for remote services
#[derive(Parser)]
#[command(name = "fleetgate")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "AEGIS_FLEET_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "AEGIS_FLEET_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the agent daemon on this node
    #[command(name = "agent")]
    Agent,

    /// Run the fleet manager daemon
    #[command(name = "manager")]
    Manager,

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// API credential management
    #[command(name = "key")]
    Key {
        #[command(subcommand)]
        command: KeyCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(&cli.log_level)?;

    match cli.command {
        Some(Commands::Agent) => commands::agent::run(cli.config).await,
        Some(Commands::Manager) => commands::manager::run(cli.config).await,
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).await
        }
        Some(Commands::Key { command }) => commands::key::handle_command(command, cli.config).await,
        None => {
            // No command provided - show help
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}
