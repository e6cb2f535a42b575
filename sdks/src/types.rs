// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Types
//!
//! Provides types functionality for the system.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Implements types

use serde::{Deserialize, Serialize};

pub use aegis_fleet_core::domain::plugin::{PluginMetadata, PluginOutput};
pub use aegis_fleet_core::domain::supervisor::{ServiceState, ServiceStatus};

/// Common types used across the SDK.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub services: Vec<ServiceStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    pub status: String,
    pub service: String,
    pub action: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSummary {
    pub id: String,
    pub name: String,
    pub host: String,
    pub port: u16,
    pub use_tls: bool,
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetHealthResponse {
    pub status: String,
    pub nodes: Vec<serde_json::Value>,
}
