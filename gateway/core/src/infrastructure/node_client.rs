// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;

use crate::domain::node::{CommandAck, DispatchError, NodeGateway, NodeRecord};
use crate::domain::supervisor::ServiceStatus;

/// Outbound client for dispatching to agent nodes, mirroring the agent HTTP
/// surface. One instance serves the whole fleet; per-node credentials are
/// supplied from the [`NodeRecord`] on every call.
pub struct HttpNodeGateway {
    client: Client,
}

#[derive(Debug, Deserialize)]
struct HealthEnvelope {
    #[allow(dead_code)]
    status: String,
    services: Vec<ServiceStatus>,
}

#[derive(Debug, Deserialize)]
struct AckEnvelope {
    service: String,
    action: String,
}

#[derive(Debug, Deserialize)]
struct FailureEnvelope {
    message: Option<String>,
    error: Option<String>,
}

impl HttpNodeGateway {
    /// Build a gateway with the configured per-call timeout. A timed-out
    /// dispatch is reported as that node's failure; it never aborts the
    /// process or the surrounding fan-out.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    fn classify_transport(error: reqwest::Error) -> DispatchError {
        if error.is_timeout() {
            DispatchError::Timeout
        } else {
            DispatchError::Unreachable(error.to_string())
        }
    }

    async fn failure_message(response: reqwest::Response) -> String {
        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<FailureEnvelope>(&body) {
            Ok(envelope) => envelope
                .message
                .or(envelope.error)
                .unwrap_or_else(|| body.clone()),
            Err(_) => body,
        }
    }
}

#[async_trait]
impl NodeGateway for HttpNodeGateway {
    async fn health(&self, node: &NodeRecord) -> Result<Vec<ServiceStatus>, DispatchError> {
        let url = format!("{}/health", node.base_url());

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", node.credential.expose()))
            .send()
            .await
            .map_err(Self::classify_transport)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(DispatchError::Unauthorized(
                Self::failure_message(response).await,
            ));
        }
        if !status.is_success() {
            return Err(DispatchError::Rejected {
                status: status.as_u16(),
                message: Self::failure_message(response).await,
            });
        }

        let envelope: HealthEnvelope = response
            .json()
            .await
            .map_err(|e| DispatchError::Protocol(e.to_string()))?;
        Ok(envelope.services)
    }

    async fn submit_command(
        &self,
        node: &NodeRecord,
        action: &str,
        service: &str,
    ) -> Result<CommandAck, DispatchError> {
        let url = format!("{}/api/v1/commands", node.base_url());

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", node.credential.expose()))
            .json(&json!({ "action": action, "service": service }))
            .send()
            .await
            .map_err(Self::classify_transport)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(DispatchError::Unauthorized(
                Self::failure_message(response).await,
            ));
        }
        if !status.is_success() {
            // The agent's structured failure body is relayed verbatim.
            return Err(DispatchError::Rejected {
                status: status.as_u16(),
                message: Self::failure_message(response).await,
            });
        }

        let envelope: AckEnvelope = response
            .json()
            .await
            .map_err(|e| DispatchError::Protocol(e.to_string()))?;
        Ok(CommandAck {
            service: envelope.service,
            action: envelope.action,
        })
    }
}
