// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Trust Audit Logger
//!
//! Emits structured audit records for every trust-gateway decision.
//!
//! Every rejection produces a `warn!` tracing event carrying the rejection
//! reason and request coordinates, so an intrusion-detection pipeline can
//! alert on bursts. Every acceptance records the authenticated principal so
//! command executions can be traced back to a caller.

use tracing::{info, warn};

use crate::domain::trust::{Principal, TrustError};

/// Writes trust decisions to the structured tracing log.
///
/// Stateless; a single instance is created at startup and shared across
/// request handlers.
pub struct TrustAuditLogger;

impl TrustAuditLogger {
    pub fn new() -> Self {
        Self
    }

    /// Record a rejected request at `WARN` level.
    pub fn record_rejection(&self, error: &TrustError, method: &str, path: &str) {
        warn!(
            reason = error.reason(),
            detail = %error,
            method,
            path,
            "Trust verification rejected request"
        );
    }

    /// Record an accepted request with its principal at `INFO` level.
    pub fn record_acceptance(&self, principal: &Principal, method: &str, path: &str) {
        info!(
            principal = %principal.subject,
            method,
            path,
            "Trust verification accepted request"
        );
    }
}

impl Default for TrustAuditLogger {
    fn default() -> Self {
        Self::new()
    }
}
