// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Manager HTTP surface: node registry, fleet health fan-out, command
//! forwarding, and the operator plugin registry.
//!
//! Node credentials never appear in responses; registry reads return
//! redacted summaries.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::application::fleet::{FleetService, ForwardError, RegisterNode};
use crate::domain::command::CommandRequest;
use crate::domain::node::{DispatchError, NodeId, NodeRecord};
use crate::domain::plugin::PluginError;
use crate::domain::trust::Principal;
use crate::infrastructure::plugins::PluginRegistry;
use crate::infrastructure::trust::{require_trust, TrustState};

pub struct ManagerState {
    pub fleet: Arc<FleetService>,
    pub plugins: Arc<PluginRegistry>,
}

/// Registry view of a node with the credential stripped.
#[derive(Debug, Serialize)]
pub struct NodeSummary {
    pub id: NodeId,
    pub name: String,
    pub host: String,
    pub port: u16,
    pub use_tls: bool,
    pub base_url: String,
    pub created_at: DateTime<Utc>,
}

impl From<&NodeRecord> for NodeSummary {
    fn from(record: &NodeRecord) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            host: record.host.clone(),
            port: record.port,
            use_tls: record.use_tls,
            base_url: record.base_url(),
            created_at: record.created_at,
        }
    }
}

pub fn router(state: Arc<ManagerState>, trust: Arc<TrustState>) -> Router {
    Router::new()
        .route("/api/v1/nodes", post(register_node).get(list_nodes))
        .route("/api/v1/nodes/{id}/commands", post(forward_command))
        .route("/api/v1/fleet/health", get(fleet_health))
        .route("/api/v1/plugins", get(list_plugins))
        .route("/api/v1/plugins/{code}", post(run_plugin))
        .with_state(state)
        .layer(middleware::from_fn_with_state(trust, require_trust))
        .layer(TraceLayer::new_for_http())
}

async fn register_node(
    State(state): State<Arc<ManagerState>>,
    Extension(_principal): Extension<Principal>,
    Json(registration): Json<RegisterNode>,
) -> impl IntoResponse {
    match state.fleet.register(registration).await {
        Ok(record) => (StatusCode::CREATED, Json(json!(NodeSummary::from(&record)))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        ),
    }
}

async fn list_nodes(
    State(state): State<Arc<ManagerState>>,
    Extension(_principal): Extension<Principal>,
) -> impl IntoResponse {
    match state.fleet.list_nodes().await {
        Ok(records) => {
            let summaries: Vec<NodeSummary> = records.iter().map(NodeSummary::from).collect();
            (StatusCode::OK, Json(json!(summaries)))
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        ),
    }
}

async fn fleet_health(
    State(state): State<Arc<ManagerState>>,
    Extension(_principal): Extension<Principal>,
) -> impl IntoResponse {
    match state.fleet.fleet_health().await {
        Ok(reports) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "nodes": reports })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        ),
    }
}

async fn forward_command(
    State(state): State<Arc<ManagerState>>,
    Extension(_principal): Extension<Principal>,
    Path(id): Path<String>,
    Json(request): Json<CommandRequest>,
) -> impl IntoResponse {
    let node_id = match NodeId::from_string(&id) {
        Ok(node_id) => node_id,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "status": "failed", "message": "Invalid node ID" })),
            )
        }
    };

    match state.fleet.forward_command(node_id, &request).await {
        Ok(ack) => (
            StatusCode::OK,
            Json(json!({
                "status": "success",
                "service": ack.service,
                "action": ack.action,
            })),
        ),
        Err(ForwardError::UnknownNode(_)) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "status": "failed", "message": "Node not found" })),
        ),
        // The agent's structured failure is relayed with its original status.
        Err(ForwardError::Dispatch(DispatchError::Rejected { status, message })) => (
            StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
            Json(json!({ "status": "failed", "message": message })),
        ),
        Err(ForwardError::Dispatch(error)) => (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "status": "failed", "message": error.to_string() })),
        ),
        Err(ForwardError::Repository(error)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "status": "failed", "message": error.to_string() })),
        ),
    }
}

async fn list_plugins(
    State(state): State<Arc<ManagerState>>,
    Extension(_principal): Extension<Principal>,
) -> impl IntoResponse {
    (StatusCode::OK, Json(json!(state.plugins.list_metadata())))
}

async fn run_plugin(
    State(state): State<Arc<ManagerState>>,
    Extension(principal): Extension<Principal>,
    Path(code): Path<String>,
    body: Bytes,
) -> impl IntoResponse {
    // Arguments are optional; an empty body means "no arguments".
    let args = if body.is_empty() {
        Value::Null
    } else {
        match serde_json::from_slice(&body) {
            Ok(value) => value,
            Err(_) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "Plugin arguments must be JSON" })),
                )
            }
        }
    };

    tracing::info!(principal = %principal.subject, plugin = %code, "Plugin execution requested");

    match state.plugins.execute(&code, &args).await {
        Ok(output) => (StatusCode::OK, Json(json!(output))),
        Err(PluginError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("Plugin '{}' not found", code) })),
        ),
        Err(error) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": error.to_string() })),
        ),
    }
}
