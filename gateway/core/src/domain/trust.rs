// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Trust Verification Gateway
//!
//! Domain model for the two-layer trust protocol shared by every agent
//! variant. Each inbound request is evaluated once, before it reaches any
//! handler, and either yields an authenticated [`Principal`] or a terminal
//! [`TrustError`].
//!
//! ## Verification Pipeline
//!
//! ```text
//! inbound request
//!   └─ TrustGateway::verify(peer_identity, authorization_header)
//!         ├─ shared-secret mode: constant-time bearer comparison
//!         └─ mutual-TLS mode:
//!               1. verified peer identity present   ← transport layer
//!               2. bearer token present             ← header layer
//!               3. token verifies (sig/alg/aud)     ← ClaimsVerifier
//!   └─ Principal attached to the request for downstream audit logging
//! ```
//!
//! ## Invariants
//!
//! - Both layers must pass in mutual-TLS mode: a missing peer identity is a
//!   hard rejection regardless of token validity, and vice versa.
//! - Checks run in the order above; the first failure returns immediately.
//! - The gateway holds no per-request state. A single instance is created at
//!   startup and shared across request handlers.
//!
//! ## Anti-Corruption Layer
//!
//! [`ClaimsVerifier`] abstracts over the cryptographic details of token
//! verification so the domain layer stays free of JWT dependencies. The
//! infrastructure implementation lives in
//! [`crate::infrastructure::trust::token`] and uses `jsonwebtoken`,
//! restricted to asymmetric signature algorithms.

use std::sync::Arc;

use crate::domain::credential::ApiCredential;

const BEARER_PREFIX: &str = "Bearer ";

/// Authenticated caller identity, propagated to handlers for audit trails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Subject claim of the presented token, or a fixed marker in
    /// shared-secret mode (the secret carries no identity).
    pub subject: String,
}

impl Principal {
    pub fn new(subject: impl Into<String>) -> Self {
        Self { subject: subject.into() }
    }
}

/// Evidence that the transport handshake produced a verified peer
/// certificate. Constructed by the serving layer only after a completed
/// mutually-authenticated handshake — never synthesised from request data.
#[derive(Debug, Clone, Default)]
pub struct PeerIdentity {
    /// Common name of the verified client certificate, when available.
    pub common_name: Option<String>,
}

impl PeerIdentity {
    /// Peer identity for a handshake-verified connection without
    /// certificate introspection.
    pub fn verified() -> Self {
        Self { common_name: None }
    }
}

/// Terminal trust failures. Variants map onto the error taxonomy:
/// transport-auth failures and token failures are both HTTP 401.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrustError {
    /// Mutual-TLS mode: no verified peer identity on the connection.
    #[error("client credential required")]
    CredentialRequired,

    /// No bearer token in the authorization header.
    #[error("missing bearer token")]
    MissingToken,

    /// Token failed verification (signature, algorithm, audience, or
    /// expiry). The reason is logged, never returned to the caller verbatim
    /// beyond this message.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Shared-secret mode: presented credential did not match.
    #[error("invalid credential")]
    InvalidCredential,
}

impl TrustError {
    /// Stable label for rejection metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::CredentialRequired => "credential_required",
            Self::MissingToken => "missing_token",
            Self::InvalidToken(_) => "invalid_token",
            Self::InvalidCredential => "invalid_credential",
        }
    }
}

/// Domain-level abstraction over signed-token verification.
///
/// Implementations must verify the signature against the provisioned issuer
/// public key, restrict the algorithm to asymmetric schemes, and require the
/// audience claim to equal the agent's configured identity — in that order,
/// before any other claim is inspected.
pub trait ClaimsVerifier: Send + Sync {
    /// Verify a raw bearer token and return the authenticated principal.
    fn verify_bearer(&self, token: &str) -> Result<Principal, TrustError>;
}

/// Per-request trust check. One of two interchangeable strategies, selected
/// by deployment mode — never both simultaneously.
pub enum TrustGateway {
    /// Bearer credential must equal the loaded [`ApiCredential`]
    /// (constant-time comparison).
    SharedSecret { credential: ApiCredential },

    /// Verified peer certificate plus a signed bearer token.
    MutualTls { verifier: Arc<dyn ClaimsVerifier> },
}

impl TrustGateway {
    pub fn shared_secret(credential: ApiCredential) -> Self {
        Self::SharedSecret { credential }
    }

    pub fn mutual_tls(verifier: Arc<dyn ClaimsVerifier>) -> Self {
        Self::MutualTls { verifier }
    }

    /// Evaluate one inbound request.
    ///
    /// `peer` is the transport-layer identity (present only after a verified
    /// mutually-authenticated handshake); `authorization` is the raw
    /// `Authorization` header value, if any.
    ///
    /// # Errors
    ///
    /// - [`TrustError::CredentialRequired`] — mutual-TLS mode, no peer identity
    /// - [`TrustError::MissingToken`] — no `Bearer` token in the header
    /// - [`TrustError::InvalidToken`] — signature/algorithm/audience/expiry failure
    /// - [`TrustError::InvalidCredential`] — shared-secret mismatch
    pub fn verify(
        &self,
        peer: Option<&PeerIdentity>,
        authorization: Option<&str>,
    ) -> Result<Principal, TrustError> {
        match self {
            Self::SharedSecret { credential } => {
                let presented = bearer_value(authorization).ok_or(TrustError::MissingToken)?;
                if credential.matches(presented) {
                    Ok(Principal::new("shared-secret"))
                } else {
                    Err(TrustError::InvalidCredential)
                }
            }
            Self::MutualTls { verifier } => {
                // Transport layer first: token validity is irrelevant
                // without a verified peer certificate.
                if peer.is_none() {
                    return Err(TrustError::CredentialRequired);
                }
                let token = bearer_value(authorization).ok_or(TrustError::MissingToken)?;
                verifier.verify_bearer(token)
            }
        }
    }
}

fn bearer_value(authorization: Option<&str>) -> Option<&str> {
    let header = authorization?;
    let token = header.strip_prefix(BEARER_PREFIX)?;
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
