// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Repository Interfaces
//!
//! Persistence contract for the node registry, following the DDD Repository
//! pattern: interface defined in the domain layer, implemented in
//! `crate::infrastructure::repositories`.
//!
//! The base design keeps the registry in memory (append/read, no concurrent
//! mutation of a single record). Durable backends slot in behind the same
//! trait without touching the dispatcher.

use async_trait::async_trait;

use crate::domain::node::{NodeId, NodeRecord};

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Repository interface for registered agent nodes.
#[async_trait]
pub trait NodeRepository: Send + Sync {
    /// Persist a node record (create; records are never mutated).
    async fn save(&self, node: NodeRecord) -> Result<(), RepositoryError>;

    /// Find a node by ID.
    async fn find_by_id(&self, id: NodeId) -> Result<Option<NodeRecord>, RepositoryError>;

    /// List all registered nodes.
    async fn list_all(&self) -> Result<Vec<NodeRecord>, RepositoryError>;

    /// Delete a node by ID.
    async fn delete(&self, id: NodeId) -> Result<(), RepositoryError>;
}
