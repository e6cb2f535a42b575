// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Mutual-TLS Server Configuration
//!
//! Builds the rustls `ServerConfig` for the mutual-trust deployment mode.
//! Client certificates are **required** and must chain to the configured
//! trust anchor; the handshake itself is refused otherwise, so no request
//! from an unauthenticated transport ever reaches the router.

use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::server::WebPkiClientVerifier;
use rustls::{RootCertStore, ServerConfig};

use crate::domain::gateway_config::TlsConfig;

/// Build a server configuration that demands a verified client certificate.
pub fn build_server_config(tls: &TlsConfig) -> Result<ServerConfig> {
    let certs = load_certs(&tls.cert_path)
        .with_context(|| format!("Failed to load server certificate {}", tls.cert_path))?;
    let key = load_private_key(&tls.key_path)
        .with_context(|| format!("Failed to load server key {}", tls.key_path))?;
    let roots = load_trust_anchor(&tls.ca_path)
        .with_context(|| format!("Failed to load CA certificate {}", tls.ca_path))?;

    let client_verifier = WebPkiClientVerifier::builder(Arc::new(roots))
        .build()
        .context("Failed to build client certificate verifier")?;

    let config = ServerConfig::builder()
        .with_client_cert_verifier(client_verifier)
        .with_single_cert(certs, key)
        .context("Invalid server certificate/key pair")?;

    Ok(config)
}

fn load_certs(path: impl AsRef<Path>) -> Result<Vec<CertificateDer<'static>>> {
    let file = std::fs::File::open(path.as_ref())?;
    let mut reader = BufReader::new(file);
    let certs = rustls_pemfile::certs(&mut reader).collect::<Result<Vec<_>, _>>()?;
    if certs.is_empty() {
        anyhow::bail!("No certificates found in {:?}", path.as_ref());
    }
    Ok(certs)
}

fn load_private_key(path: impl AsRef<Path>) -> Result<PrivateKeyDer<'static>> {
    let file = std::fs::File::open(path.as_ref())?;
    let mut reader = BufReader::new(file);
    rustls_pemfile::private_key(&mut reader)?
        .ok_or_else(|| anyhow::anyhow!("No private key found in {:?}", path.as_ref()))
}

fn load_trust_anchor(path: impl AsRef<Path>) -> Result<RootCertStore> {
    let file = std::fs::File::open(path.as_ref())?;
    let mut reader = BufReader::new(file);
    let mut roots = RootCertStore::empty();
    for cert in rustls_pemfile::certs(&mut reader) {
        roots.add(cert?)?;
    }
    if roots.is_empty() {
        anyhow::bail!("No CA certificates found in {:?}", path.as_ref());
    }
    Ok(roots)
}
