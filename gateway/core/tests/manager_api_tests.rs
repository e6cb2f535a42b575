// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Manager API surface tests: registry, fan-out, forwarding, and plugins
//! exercised through the real router with a mocked node gateway.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use aegis_fleet_core::application::fleet::FleetService;
use aegis_fleet_core::domain::credential::ApiCredential;
use aegis_fleet_core::domain::node::{
    CommandAck, DispatchError, NodeGateway, NodeRecord,
};
use aegis_fleet_core::domain::supervisor::{ServiceState, ServiceStatus};
use aegis_fleet_core::domain::trust::TrustGateway;
use aegis_fleet_core::infrastructure::plugins::PluginRegistry;
use aegis_fleet_core::infrastructure::repositories::InMemoryNodeRepository;
use aegis_fleet_core::infrastructure::trust::TrustState;
use aegis_fleet_core::presentation::manager_api::{router, ManagerState};

const MANAGER_SECRET_LEN: usize = 64;

/// Gateway double: nodes named "down-*" are unreachable, everything else
/// responds.
struct ScriptedGateway;

#[async_trait]
impl NodeGateway for ScriptedGateway {
    async fn health(&self, node: &NodeRecord) -> Result<Vec<ServiceStatus>, DispatchError> {
        if node.name.starts_with("down-") {
            return Err(DispatchError::Timeout);
        }
        Ok(vec![ServiceStatus {
            name: "api-server".to_string(),
            status: ServiceState::Running,
            uptime_ms: 60_000,
            memory_bytes: 1024,
            cpu_percent: 0.2,
        }])
    }

    async fn submit_command(
        &self,
        node: &NodeRecord,
        action: &str,
        service: &str,
    ) -> Result<CommandAck, DispatchError> {
        if node.name.starts_with("down-") {
            return Err(DispatchError::Unreachable("connection refused".to_string()));
        }
        if action == "delete" {
            // The agent's filter rejected the verb; relayed verbatim.
            return Err(DispatchError::Rejected {
                status: 400,
                message: "action 'delete' is not a recognised lifecycle verb".to_string(),
            });
        }
        Ok(CommandAck {
            service: service.to_string(),
            action: action.to_string(),
        })
    }
}

fn manager_secret() -> String {
    "m".repeat(MANAGER_SECRET_LEN)
}

fn manager_app() -> axum::Router {
    let fleet = Arc::new(FleetService::new(
        Arc::new(InMemoryNodeRepository::new()),
        Arc::new(ScriptedGateway),
    ));
    let state = Arc::new(ManagerState {
        fleet,
        plugins: Arc::new(PluginRegistry::with_builtins()),
    });
    let trust = TrustGateway::shared_secret(ApiCredential::new(manager_secret()).unwrap());
    router(state, Arc::new(TrustState::new(trust)))
}

fn authed(builder: axum::http::request::Builder) -> axum::http::request::Builder {
    builder.header("authorization", format!("Bearer {}", manager_secret()))
}

fn register_body(name: &str) -> String {
    json!({
        "name": name,
        "host": "10.0.0.1",
        "port": 8443,
        "credential": "c".repeat(64),
    })
    .to_string()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn register(app: &axum::Router, name: &str) -> Value {
    let response = app
        .clone()
        .oneshot(
            authed(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/nodes")
                    .header("content-type", "application/json"),
            )
            .body(Body::from(register_body(name)))
            .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

#[tokio::test]
async fn test_manager_routes_require_authentication() {
    let app = manager_app();
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/nodes")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_registration_returns_summary_without_credential() {
    let app = manager_app();
    let summary = register(&app, "edge-1").await;

    assert_eq!(summary["name"], "edge-1");
    assert_eq!(summary["base_url"], "http://10.0.0.1:8443");
    assert!(summary.get("credential").is_none());
    assert!(summary["id"].as_str().is_some());
}

#[tokio::test]
async fn test_list_nodes_redacts_credentials() {
    let app = manager_app();
    register(&app, "edge-1").await;
    register(&app, "edge-2").await;

    let response = app
        .oneshot(
            authed(Request::builder().method("GET").uri("/api/v1/nodes"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let nodes = body.as_array().unwrap();
    assert_eq!(nodes.len(), 2);
    for node in nodes {
        assert!(node.get("credential").is_none());
    }
}

#[tokio::test]
async fn test_fleet_health_marks_only_the_unreachable_node_failed() {
    let app = manager_app();
    register(&app, "edge-1").await;
    register(&app, "down-2").await;
    register(&app, "edge-3").await;

    let response = app
        .oneshot(
            authed(Request::builder().method("GET").uri("/api/v1/fleet/health"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let nodes = body["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 3);

    let failed: Vec<&Value> = nodes
        .iter()
        .filter(|n| n["status"] == "failed")
        .collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0]["name"], "down-2");

    let healthy = nodes.iter().filter(|n| n["status"] == "ok").count();
    assert_eq!(healthy, 2);
}

#[tokio::test]
async fn test_forward_command_relays_success() {
    let app = manager_app();
    let summary = register(&app, "edge-1").await;
    let id = summary["id"].as_str().unwrap();

    let response = app
        .oneshot(
            authed(
                Request::builder()
                    .method("POST")
                    .uri(format!("/api/v1/nodes/{}/commands", id))
                    .header("content-type", "application/json"),
            )
            .body(Body::from(
                json!({ "action": "restart", "service": "api-server" }).to_string(),
            ))
            .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "status": "success", "service": "api-server", "action": "restart" })
    );
}

#[tokio::test]
async fn test_forward_command_relays_agent_rejection_verbatim() {
    let app = manager_app();
    let summary = register(&app, "edge-1").await;
    let id = summary["id"].as_str().unwrap();

    let response = app
        .oneshot(
            authed(
                Request::builder()
                    .method("POST")
                    .uri(format!("/api/v1/nodes/{}/commands", id))
                    .header("content-type", "application/json"),
            )
            .body(Body::from(
                json!({ "action": "delete", "service": "api-server" }).to_string(),
            ))
            .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["status"], "failed");
    assert!(body["message"].as_str().unwrap().contains("delete"));
}

#[tokio::test]
async fn test_forward_command_unknown_node_is_404() {
    let app = manager_app();
    let response = app
        .oneshot(
            authed(
                Request::builder()
                    .method("POST")
                    .uri(format!(
                        "/api/v1/nodes/{}/commands",
                        uuid::Uuid::new_v4()
                    ))
                    .header("content-type", "application/json"),
            )
            .body(Body::from(
                json!({ "action": "restart", "service": "api-server" }).to_string(),
            ))
            .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_forward_command_invalid_id_is_400() {
    let app = manager_app();
    let response = app
        .oneshot(
            authed(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/nodes/not-a-uuid/commands")
                    .header("content-type", "application/json"),
            )
            .body(Body::from(
                json!({ "action": "restart", "service": "api-server" }).to_string(),
            ))
            .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_plugin_listing_and_unknown_code() {
    let app = manager_app();

    let response = app
        .clone()
        .oneshot(
            authed(Request::builder().method("GET").uri("/api/v1/plugins"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let plugins = body_json(response).await;
    let codes: Vec<&str> = plugins
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["code"].as_str().unwrap())
        .collect();
    assert!(codes.contains(&"git-pull"));
    assert!(codes.contains(&"sys-stats"));

    let response = app
        .oneshot(
            authed(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/plugins/no-such-plugin")
                    .header("content-type", "application/json"),
            )
            .body(Body::from("{}"))
            .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
