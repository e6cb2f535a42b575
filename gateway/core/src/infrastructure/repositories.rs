// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::node::{NodeId, NodeRecord};
use crate::domain::repository::{NodeRepository, RepositoryError};

/// In-memory node registry for the base design. Records are append/read;
/// no concurrent mutation of a single record ever occurs.
pub struct InMemoryNodeRepository {
    // Maps NodeId -> NodeRecord
    nodes: Arc<RwLock<HashMap<NodeId, NodeRecord>>>,
}

impl InMemoryNodeRepository {
    pub fn new() -> Self {
        Self {
            nodes: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryNodeRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeRepository for InMemoryNodeRepository {
    async fn save(&self, node: NodeRecord) -> Result<(), RepositoryError> {
        let mut guard = self.nodes.write().await;
        guard.insert(node.id, node);
        Ok(())
    }

    async fn find_by_id(&self, id: NodeId) -> Result<Option<NodeRecord>, RepositoryError> {
        let guard = self.nodes.read().await;
        Ok(guard.get(&id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<NodeRecord>, RepositoryError> {
        let guard = self.nodes.read().await;
        Ok(guard.values().cloned().collect())
    }

    async fn delete(&self, id: NodeId) -> Result<(), RepositoryError> {
        let mut guard = self.nodes.write().await;
        guard
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }
}
