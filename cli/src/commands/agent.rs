// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Agent daemon: trust gateway + authorization filter in front of the
//! local process supervisor.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Extension;
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tracing::info;

use aegis_fleet_core::application::command::CommandService;
use aegis_fleet_core::application::health::HealthService;
use aegis_fleet_core::domain::command::{CommandPolicy, ServiceAllowlist};
use aegis_fleet_core::domain::gateway_config::TrustMode;
use aegis_fleet_core::domain::trust::{PeerIdentity, TrustGateway};
use aegis_fleet_core::infrastructure::keystore::FileKeyStore;
use aegis_fleet_core::infrastructure::supervisor::Pm2Supervisor;
use aegis_fleet_core::infrastructure::tls::build_server_config;
use aegis_fleet_core::infrastructure::trust::{BearerTokenVerifier, TrustState};
use aegis_fleet_core::presentation::api::{router, AgentState};

use super::{install_metrics_exporter, load_config, shutdown_signal};

pub async fn run(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    install_metrics_exporter(&config)?;

    info!(
        node = %config.metadata.name,
        identity = %config.spec.identity.id,
        "AEGIS fleet agent starting"
    );

    // Credential: loaded once, immutable for the process lifetime.
    let credential = FileKeyStore::new(&config.spec.trust.key_file)
        .load_or_generate()
        .context("Failed to initialise credential store")?;

    let supervisor = Arc::new(Pm2Supervisor::from_config(&config.spec.supervisor));
    let allowlist = ServiceAllowlist::new(config.spec.services.allowed.iter().cloned());
    if allowlist.is_empty() {
        tracing::warn!("Service allowlist is empty — every command will be rejected");
    }

    let visibility = if config.spec.services.expose_all_in_health {
        None
    } else {
        Some(allowlist.clone())
    };

    let state = Arc::new(AgentState {
        health: Arc::new(HealthService::new(supervisor.clone(), visibility)),
        commands: Arc::new(CommandService::new(
            supervisor,
            CommandPolicy::new(allowlist),
        )),
    });

    let gateway = match config.spec.trust.mode {
        TrustMode::SharedSecret => TrustGateway::shared_secret(credential),
        TrustMode::MutualTls => {
            let issuer_key_path = config
                .spec
                .trust
                .issuer_key_path
                .as_ref()
                .context("mutual-tls mode requires spec.trust.issuer_key_path")?;
            let verifier = BearerTokenVerifier::from_pem_file(
                issuer_key_path,
                &config.spec.identity.id,
                config.spec.trust.issuer.as_deref(),
            )
            .context("Failed to load issuer public key")?;
            TrustGateway::mutual_tls(Arc::new(verifier))
        }
    };

    let app = router(state, Arc::new(TrustState::new(gateway)));

    let addr: SocketAddr = format!(
        "{}:{}",
        config.spec.network.bind_address, config.spec.network.port
    )
    .parse()
    .context("Invalid bind address")?;

    match &config.spec.network.tls {
        Some(tls) => {
            // Mutual TLS: the handshake refuses clients without a
            // certificate chained to the configured CA, so every request
            // that reaches the router carries a verified peer identity.
            let server_config = build_server_config(tls)?;
            let rustls_config = RustlsConfig::from_config(Arc::new(server_config));
            let app = app.layer(Extension(PeerIdentity::verified()));

            info!("Agent listening on https://{} (mutual TLS)", addr);
            axum_server::bind_rustls(addr, rustls_config)
                .serve(app.into_make_service())
                .await
                .context("HTTPS server failed")?;
        }
        None => {
            let listener = TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Failed to bind to {}", addr))?;

            info!("Agent listening on http://{}", addr);
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await
                .context("HTTP server failed")?;
        }
    }

    info!("Agent shutting down");
    Ok(())
}
