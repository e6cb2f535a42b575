// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::credential::ApiCredential;
use crate::domain::supervisor::ServiceStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Manager-side record of one registered agent node.
///
/// Read-mostly reference data: created at registration, read on every
/// dispatch, never mutated afterwards. No uniqueness constraint is enforced
/// on host/port — registering the same agent twice is an operator error the
/// registry does not prevent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub name: String,
    pub host: String,
    pub port: u16,
    /// Dispatch over HTTPS (mutual-trust agents) instead of plain HTTP.
    pub use_tls: bool,
    pub credential: ApiCredential,
    pub created_at: DateTime<Utc>,
}

impl NodeRecord {
    pub fn new(
        name: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        use_tls: bool,
        credential: ApiCredential,
    ) -> Self {
        Self {
            id: NodeId::new(),
            name: name.into(),
            host: host.into(),
            port,
            use_tls,
            credential,
            created_at: Utc::now(),
        }
    }

    /// Base URL derived from host, port, and transport mode.
    pub fn base_url(&self) -> String {
        let scheme = if self.use_tls { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }
}

/// Outbound dispatch failures (manager → agent). Recovered per-node during
/// fan-out and surfaced as that node's status, never thrown further.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    #[error("node unreachable: {0}")]
    Unreachable(String),

    #[error("dispatch timed out")]
    Timeout,

    #[error("node rejected credentials: {0}")]
    Unauthorized(String),

    /// The agent returned a structured failure body. Carried verbatim so the
    /// manager can relay it to the caller unchanged.
    #[error("node rejected command ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("malformed node response: {0}")]
    Protocol(String),
}

/// Acknowledgement relayed from an agent after a successful command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandAck {
    pub service: String,
    pub action: String,
}

/// Outcome of one node's health query during fan-out.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum NodeHealthOutcome {
    Ok { services: Vec<ServiceStatus> },
    Failed { error: String },
}

/// One entry in the fleet health report. Every registered node produces
/// exactly one entry; a node's failure never removes it from the report.
#[derive(Debug, Clone, Serialize)]
pub struct NodeHealthReport {
    pub node_id: NodeId,
    pub name: String,
    #[serde(flatten)]
    pub outcome: NodeHealthOutcome,
}

/// Outbound channel to one agent node, mirroring the agent HTTP surface as
/// a client. Implemented with reqwest in
/// [`crate::infrastructure::node_client`]; mocked in tests.
#[async_trait::async_trait]
pub trait NodeGateway: Send + Sync {
    /// Query the node's health endpoint with its stored credential.
    async fn health(&self, node: &NodeRecord) -> Result<Vec<ServiceStatus>, DispatchError>;

    /// Submit a lifecycle command. Action and service are relayed as-is;
    /// the agent's own authorization filter is the boundary.
    async fn submit_command(
        &self,
        node: &NodeRecord,
        action: &str,
        service: &str,
    ) -> Result<CommandAck, DispatchError>;
}
