// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! API credential inspection
//!
//! Commands: show

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use aegis_fleet_core::domain::gateway_config::GatewayConfigManifest;
use aegis_fleet_core::infrastructure::keystore::FileKeyStore;

#[derive(Subcommand)]
pub enum KeyCommand {
    /// Print the persisted API credential (generates one if absent)
    Show {
        /// Key file path (default: from configuration)
        #[arg(long, value_name = "FILE")]
        key_file: Option<PathBuf>,
    },
}

pub async fn handle_command(command: KeyCommand, config_override: Option<PathBuf>) -> Result<()> {
    match command {
        KeyCommand::Show { key_file } => show(key_file, config_override).await,
    }
}

async fn show(key_file: Option<PathBuf>, config_override: Option<PathBuf>) -> Result<()> {
    let path = match key_file {
        Some(path) => path,
        None => {
            let config = GatewayConfigManifest::load_or_default(config_override)
                .context("Failed to load configuration")?;
            PathBuf::from(config.spec.trust.key_file)
        }
    };

    let credential = FileKeyStore::new(&path)
        .load_or_generate()
        .context("Failed to load credential")?;

    println!();
    println!("{}", "=== AGENT API KEY ===".bold());
    println!("Key:  {}", credential.expose());
    println!("File: {}", path.display());
    println!("{}", "Copy the key into the manager's node registration.".dimmed());
    println!();

    Ok(())
}
