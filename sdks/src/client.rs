// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use anyhow::Result;
use reqwest::Client;
use serde_json::json;

use crate::types::{
    CommandResponse, FleetHealthResponse, HealthResponse, NodeSummary, PluginMetadata,
    PluginOutput,
};

/// Client for interacting with an AEGIS fleet gateway node (agent or
/// manager).
pub struct FleetClient {
    base_url: String,
    client: Client,
    api_key: Option<String>,
}

impl FleetClient {
    /// Create a new fleet client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: Client::new(),
            api_key: None,
        }
    }

    /// Set the API key (shared secret or signed token) for authentication.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(key) = &self.api_key {
            req.header("Authorization", format!("Bearer {}", key))
        } else {
            req
        }
    }

    /// Query an agent node's health endpoint.
    pub async fn health(&self) -> Result<HealthResponse> {
        let url = format!("{}/health", self.base_url);
        let response = self.authorize(self.client.get(&url)).send().await?;
        let health = response.error_for_status()?.json().await?;
        Ok(health)
    }

    /// Submit a lifecycle command to an agent node.
    pub async fn submit_command(&self, action: &str, service: &str) -> Result<CommandResponse> {
        let url = format!("{}/api/v1/commands", self.base_url);
        let payload = json!({ "action": action, "service": service });

        let response = self
            .authorize(self.client.post(&url).json(&payload))
            .send()
            .await?;
        let outcome = response.error_for_status()?.json().await?;
        Ok(outcome)
    }

    /// Register an agent node with the fleet manager.
    pub async fn register_node(
        &self,
        name: &str,
        host: &str,
        port: u16,
        credential: &str,
    ) -> Result<NodeSummary> {
        let url = format!("{}/api/v1/nodes", self.base_url);
        let payload = json!({
            "name": name,
            "host": host,
            "port": port,
            "credential": credential,
        });

        let response = self
            .authorize(self.client.post(&url).json(&payload))
            .send()
            .await?;
        let summary = response.error_for_status()?.json().await?;
        Ok(summary)
    }

    /// List nodes registered with the fleet manager.
    pub async fn list_nodes(&self) -> Result<Vec<NodeSummary>> {
        let url = format!("{}/api/v1/nodes", self.base_url);
        let response = self.authorize(self.client.get(&url)).send().await?;
        let nodes = response.error_for_status()?.json().await?;
        Ok(nodes)
    }

    /// Fan-out health query across the whole fleet via the manager.
    pub async fn fleet_health(&self) -> Result<FleetHealthResponse> {
        let url = format!("{}/api/v1/fleet/health", self.base_url);
        let response = self.authorize(self.client.get(&url)).send().await?;
        let report = response.error_for_status()?.json().await?;
        Ok(report)
    }

    /// Forward a lifecycle command to a registered node via the manager.
    pub async fn forward_command(
        &self,
        node_id: &str,
        action: &str,
        service: &str,
    ) -> Result<CommandResponse> {
        let url = format!("{}/api/v1/nodes/{}/commands", self.base_url, node_id);
        let payload = json!({ "action": action, "service": service });

        let response = self
            .authorize(self.client.post(&url).json(&payload))
            .send()
            .await?;
        let outcome = response.error_for_status()?.json().await?;
        Ok(outcome)
    }

    /// List the manager's registered operator plugins.
    pub async fn list_plugins(&self) -> Result<Vec<PluginMetadata>> {
        let url = format!("{}/api/v1/plugins", self.base_url);
        let response = self.authorize(self.client.get(&url)).send().await?;
        let plugins = response.error_for_status()?.json().await?;
        Ok(plugins)
    }

    /// Execute a manager plugin by code.
    pub async fn run_plugin(&self, code: &str, args: serde_json::Value) -> Result<PluginOutput> {
        let url = format!("{}/api/v1/plugins/{}", self.base_url, code);
        let response = self
            .authorize(self.client.post(&url).json(&args))
            .send()
            .await?;
        let output = response.error_for_status()?.json().await?;
        Ok(output)
    }
}
