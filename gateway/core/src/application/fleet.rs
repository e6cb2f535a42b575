// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Fleet Registry & Dispatcher
//!
//! Manager-side application service: registers agent nodes, fans out health
//! queries across the fleet, and forwards individual commands.
//!
//! Health fan-out issues all per-node queries concurrently and joins the
//! results. Each node's outcome is captured independently — a timeout or
//! rejection on one node never aborts the fan-out for the others — and the
//! ordering of the result set carries no meaning.

use std::sync::Arc;

use futures::future::join_all;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::credential::ApiCredential;
use crate::domain::command::CommandRequest;
use crate::domain::node::{
    CommandAck, DispatchError, NodeGateway, NodeHealthOutcome, NodeHealthReport, NodeId, NodeRecord,
};
use crate::domain::repository::{NodeRepository, RepositoryError};

/// Registration payload for one agent node.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterNode {
    pub name: String,
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub use_tls: bool,
    pub credential: ApiCredential,
}

#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("node {0} is not registered")]
    UnknownNode(NodeId),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

pub struct FleetService {
    repository: Arc<dyn NodeRepository>,
    gateway: Arc<dyn NodeGateway>,
}

impl FleetService {
    pub fn new(repository: Arc<dyn NodeRepository>, gateway: Arc<dyn NodeGateway>) -> Self {
        Self {
            repository,
            gateway,
        }
    }

    /// Register one agent node and persist its record.
    pub async fn register(&self, registration: RegisterNode) -> Result<NodeRecord, RepositoryError> {
        let record = NodeRecord::new(
            registration.name,
            registration.host,
            registration.port,
            registration.use_tls,
            registration.credential,
        );
        self.repository.save(record.clone()).await?;
        info!(node_id = %record.id, name = %record.name, url = %record.base_url(), "Registered agent node");
        Ok(record)
    }

    pub async fn list_nodes(&self) -> Result<Vec<NodeRecord>, RepositoryError> {
        self.repository.list_all().await
    }

    /// Query every registered node concurrently. Always returns one report
    /// per node; unreachable nodes are marked failed with their reason.
    pub async fn fleet_health(&self) -> Result<Vec<NodeHealthReport>, RepositoryError> {
        let nodes = self.repository.list_all().await?;

        let queries = nodes.into_iter().map(|node| {
            let gateway = self.gateway.clone();
            async move {
                let outcome = match gateway.health(&node).await {
                    Ok(services) => NodeHealthOutcome::Ok { services },
                    Err(error) => {
                        warn!(node_id = %node.id, name = %node.name, error = %error, "Node health query failed");
                        NodeHealthOutcome::Failed {
                            error: error.to_string(),
                        }
                    }
                };
                NodeHealthReport {
                    node_id: node.id,
                    name: node.name,
                    outcome,
                }
            }
        });

        Ok(join_all(queries).await)
    }

    /// Forward one command to one node, relaying the agent's structured
    /// result verbatim. The agent's own authorization filter decides; the
    /// manager does not pre-screen the verb or service.
    pub async fn forward_command(
        &self,
        id: NodeId,
        request: &CommandRequest,
    ) -> Result<CommandAck, ForwardError> {
        let node = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(ForwardError::UnknownNode(id))?;

        let ack = self
            .gateway
            .submit_command(&node, &request.action, &request.service)
            .await?;

        info!(
            node_id = %node.id,
            name = %node.name,
            action = %ack.action,
            service = %ack.service,
            "Command forwarded"
        );
        Ok(ack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::supervisor::{ServiceState, ServiceStatus};
    use crate::infrastructure::repositories::InMemoryNodeRepository;
    use async_trait::async_trait;
    use std::collections::HashSet;

    // Mock gateway: fails for hosts in `unreachable`, answers otherwise.
    struct MockGateway {
        unreachable: HashSet<String>,
    }

    #[async_trait]
    impl NodeGateway for MockGateway {
        async fn health(&self, node: &NodeRecord) -> Result<Vec<ServiceStatus>, DispatchError> {
            if self.unreachable.contains(&node.host) {
                return Err(DispatchError::Timeout);
            }
            Ok(vec![ServiceStatus {
                name: "api-server".to_string(),
                status: ServiceState::Running,
                uptime_ms: 1000,
                memory_bytes: 1024,
                cpu_percent: 0.1,
            }])
        }

        async fn submit_command(
            &self,
            node: &NodeRecord,
            action: &str,
            service: &str,
        ) -> Result<CommandAck, DispatchError> {
            if self.unreachable.contains(&node.host) {
                return Err(DispatchError::Unreachable("connection refused".to_string()));
            }
            Ok(CommandAck {
                service: service.to_string(),
                action: action.to_string(),
            })
        }
    }

    fn credential() -> ApiCredential {
        ApiCredential::new("e".repeat(64)).unwrap()
    }

    fn fleet(unreachable: &[&str]) -> FleetService {
        FleetService::new(
            Arc::new(InMemoryNodeRepository::new()),
            Arc::new(MockGateway {
                unreachable: unreachable.iter().map(|s| s.to_string()).collect(),
            }),
        )
    }

    fn registration(name: &str, host: &str) -> RegisterNode {
        RegisterNode {
            name: name.to_string(),
            host: host.to_string(),
            port: 8443,
            use_tls: false,
            credential: credential(),
        }
    }

    #[tokio::test]
    async fn test_register_assigns_id_and_persists() {
        let fleet = fleet(&[]);
        let record = fleet.register(registration("edge-1", "10.0.0.1")).await.unwrap();
        assert_eq!(record.base_url(), "http://10.0.0.1:8443");

        let listed = fleet.list_nodes().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, record.id);
    }

    #[tokio::test]
    async fn test_fleet_health_reports_every_node_despite_one_failure() {
        let fleet = fleet(&["10.0.0.2"]);
        fleet.register(registration("edge-1", "10.0.0.1")).await.unwrap();
        fleet.register(registration("edge-2", "10.0.0.2")).await.unwrap();
        fleet.register(registration("edge-3", "10.0.0.3")).await.unwrap();

        let reports = fleet.fleet_health().await.unwrap();
        assert_eq!(reports.len(), 3);

        let failed: Vec<&NodeHealthReport> = reports
            .iter()
            .filter(|r| matches!(r.outcome, NodeHealthOutcome::Failed { .. }))
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].name, "edge-2");

        let healthy = reports
            .iter()
            .filter(|r| matches!(r.outcome, NodeHealthOutcome::Ok { .. }))
            .count();
        assert_eq!(healthy, 2);
    }

    #[tokio::test]
    async fn test_fleet_health_with_empty_registry() {
        let fleet = fleet(&[]);
        assert!(fleet.fleet_health().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_forward_command_relays_ack() {
        let fleet = fleet(&[]);
        let record = fleet.register(registration("edge-1", "10.0.0.1")).await.unwrap();

        let ack = fleet
            .forward_command(
                record.id,
                &CommandRequest {
                    action: "restart".to_string(),
                    service: "api-server".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(ack.action, "restart");
        assert_eq!(ack.service, "api-server");
    }

    #[tokio::test]
    async fn test_forward_command_to_unknown_node() {
        let fleet = fleet(&[]);
        let result = fleet
            .forward_command(
                NodeId::new(),
                &CommandRequest {
                    action: "restart".to_string(),
                    service: "api-server".to_string(),
                },
            )
            .await;
        assert!(matches!(result, Err(ForwardError::UnknownNode(_))));
    }

    #[tokio::test]
    async fn test_forward_command_surfaces_dispatch_failure() {
        let fleet = fleet(&["10.0.0.9"]);
        let record = fleet.register(registration("edge-9", "10.0.0.9")).await.unwrap();

        let result = fleet
            .forward_command(
                record.id,
                &CommandRequest {
                    action: "stop".to_string(),
                    service: "api-server".to_string(),
                },
            )
            .await;
        assert!(matches!(
            result,
            Err(ForwardError::Dispatch(DispatchError::Unreachable(_)))
        ));
    }
}
