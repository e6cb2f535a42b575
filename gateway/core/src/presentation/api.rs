// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Agent HTTP surface: two authenticated operations.
//!
//! Every route sits behind the trust middleware; the request lifecycle is
//! Received → TrustVerified → Authorized → Executed → Responded, with
//! Rejected as the terminal branch at either of the first two gates.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::application::command::{CommandError, CommandService};
use crate::application::health::HealthService;
use crate::domain::command::{CommandRejection, CommandRequest};
use crate::domain::trust::Principal;
use crate::infrastructure::trust::{require_trust, TrustState};

pub struct AgentState {
    pub health: Arc<HealthService>,
    pub commands: Arc<CommandService>,
}

pub fn router(state: Arc<AgentState>, trust: Arc<TrustState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/commands", post(submit_command))
        .with_state(state)
        .layer(middleware::from_fn_with_state(trust, require_trust))
        .layer(TraceLayer::new_for_http())
}

async fn health(
    State(state): State<Arc<AgentState>>,
    Extension(_principal): Extension<Principal>,
) -> impl IntoResponse {
    match state.health.snapshot().await {
        Ok(services) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "services": services })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        ),
    }
}

async fn submit_command(
    State(state): State<Arc<AgentState>>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<CommandRequest>,
) -> impl IntoResponse {
    match state.commands.submit(&principal, &request).await {
        Ok(command) => (
            StatusCode::OK,
            Json(json!({
                "status": "success",
                "service": command.service,
                "action": command.action,
            })),
        ),
        Err(CommandError::Rejected(rejection)) => {
            let status = match rejection {
                CommandRejection::InvalidAction(_) => StatusCode::BAD_REQUEST,
                CommandRejection::ServiceNotAllowed(_) => StatusCode::FORBIDDEN,
            };
            (
                status,
                Json(json!({ "status": "failed", "message": rejection.to_string() })),
            )
        }
        Err(CommandError::Supervisor(error)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "status": "failed", "message": error.to_string() })),
        ),
    }
}
