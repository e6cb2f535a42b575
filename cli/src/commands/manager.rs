// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Manager daemon: node registry, fleet dispatcher, and operator plugins.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;

use aegis_fleet_core::application::fleet::FleetService;
use aegis_fleet_core::domain::trust::TrustGateway;
use aegis_fleet_core::infrastructure::keystore::FileKeyStore;
use aegis_fleet_core::infrastructure::node_client::HttpNodeGateway;
use aegis_fleet_core::infrastructure::plugins::PluginRegistry;
use aegis_fleet_core::infrastructure::repositories::InMemoryNodeRepository;
use aegis_fleet_core::infrastructure::trust::TrustState;
use aegis_fleet_core::presentation::manager_api::{router, ManagerState};

use super::{install_metrics_exporter, load_config, shutdown_signal};

pub async fn run(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    install_metrics_exporter(&config)?;

    info!(node = %config.metadata.name, "AEGIS fleet manager starting");

    // The manager authenticates its own callers with the same shared-secret
    // gateway the agents use.
    let credential = FileKeyStore::new(&config.spec.trust.key_file)
        .load_or_generate()
        .context("Failed to initialise credential store")?;

    let node_gateway = HttpNodeGateway::new(config.spec.dispatch.timeout)
        .context("Failed to build dispatch client")?;

    let fleet = Arc::new(FleetService::new(
        Arc::new(InMemoryNodeRepository::new()),
        Arc::new(node_gateway),
    ));

    let plugins = Arc::new(PluginRegistry::with_builtins());
    info!(count = plugins.list_metadata().len(), "Plugins loaded");

    let state = Arc::new(ManagerState { fleet, plugins });
    let trust = Arc::new(TrustState::new(TrustGateway::shared_secret(credential)));
    let app = router(state, trust);

    let addr: SocketAddr = format!(
        "{}:{}",
        config.spec.network.bind_address, config.spec.network.port
    )
    .parse()
    .context("Invalid bind address")?;

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Manager listening on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Manager shutting down");
    Ok(())
}
