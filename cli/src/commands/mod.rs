// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the fleet gateway CLI

pub mod agent;
pub mod manager;
pub mod config;
pub mod key;

pub use self::config::ConfigCommand;
pub use self::key::KeyCommand;

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::info;

use aegis_fleet_core::domain::gateway_config::GatewayConfigManifest;

/// Load, override, and validate the manifest for a daemon role.
pub(crate) fn load_config(path: Option<std::path::PathBuf>) -> Result<GatewayConfigManifest> {
    let config = GatewayConfigManifest::load_or_default(path)
        .context("Failed to load configuration")?;
    config
        .validate()
        .context("Configuration validation failed")?;
    Ok(config)
}

/// Install the Prometheus exposition endpoint when configured.
pub(crate) fn install_metrics_exporter(config: &GatewayConfigManifest) -> Result<()> {
    if let Some(observability) = &config.spec.observability {
        if let Some(port) = observability.metrics_port {
            let addr = SocketAddr::from(([0, 0, 0, 0], port));
            metrics_exporter_prometheus::PrometheusBuilder::new()
                .with_http_listener(addr)
                .install()
                .context("Failed to install Prometheus exporter")?;
            info!("Metrics exposition on {}", addr);
        }
    }
    Ok(())
}

pub(crate) async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
