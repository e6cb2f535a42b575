// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Trust Middleware
//!
//! The axum layer that runs the [`TrustGateway`] once per inbound request,
//! before the request reaches any handler.
//!
//! ## Processing Pipeline
//!
//! ```text
//! incoming request
//!   └─ require_trust(state, request)
//!         ├─ PeerIdentity pulled from request extensions (set by the
//!         │  serving layer only after a verified mTLS handshake)
//!         ├─ TrustGateway::verify(peer, authorization)   ← all checks
//!         └─ Principal inserted into request extensions for handlers
//! ```
//!
//! This layer must wrap **every** authenticated route, without exception.
//! Rejections are counted (`fleet_trust_rejections_total`) and audited;
//! acceptances propagate the principal for audit trails.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use metrics::counter;
use serde_json::json;

use crate::domain::trust::{PeerIdentity, TrustGateway};
use crate::infrastructure::trust::audit::TrustAuditLogger;

/// Shared state for the trust layer: the gateway strategy plus the audit
/// sink. Created once at startup.
pub struct TrustState {
    pub gateway: TrustGateway,
    pub audit: TrustAuditLogger,
}

impl TrustState {
    pub fn new(gateway: TrustGateway) -> Self {
        Self {
            gateway,
            audit: TrustAuditLogger::new(),
        }
    }
}

/// Per-request trust check. Wire with
/// `axum::middleware::from_fn_with_state(trust_state, require_trust)`.
pub async fn require_trust(
    State(state): State<Arc<TrustState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let peer = request.extensions().get::<PeerIdentity>().cloned();
    let authorization = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    match state.gateway.verify(peer.as_ref(), authorization.as_deref()) {
        Ok(principal) => {
            counter!("fleet_trust_acceptances_total").increment(1);
            state.audit.record_acceptance(&principal, &method, &path);
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(error) => {
            counter!("fleet_trust_rejections_total", "reason" => error.reason()).increment(1);
            state.audit.record_rejection(&error, &method, &path);
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": error.to_string() })),
            )
                .into_response()
        }
    }
}
