// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Descriptive metadata for one command plugin, rendered by the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginMetadata {
    pub name: String,
    /// Stable identifier used to invoke the plugin.
    pub code: String,
    pub description: String,
}

impl PluginMetadata {
    /// A plugin is registrable only when both its name and code are present.
    pub fn is_valid(&self) -> bool {
        !self.name.is_empty() && !self.code.is_empty()
    }
}

/// Result of one plugin execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginOutput {
    pub output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Error)]
pub enum PluginError {
    #[error("plugin '{0}' not found")]
    NotFound(String),

    #[error("plugin execution failed: {0}")]
    ExecutionFailed(String),
}

/// Capability contract for manager-side command plugins.
///
/// Two required members — metadata and an execute entry point — matching
/// the registry's validation. Implementations run operator-facing shell
/// commands and must surface failures as errors, never panic.
#[async_trait]
pub trait CommandPlugin: Send + Sync {
    fn metadata(&self) -> &PluginMetadata;

    async fn execute(&self, args: &Value) -> Result<PluginOutput, PluginError>;
}
