// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Command Plugin Registry - Explicit Registration and Dispatch
//
// Manages operator command plugins on the manager node. Plugins are
// registered explicitly at startup from a known set — there is no ambient
// dynamic loading. Registration validates the two-member plugin contract
// (metadata + execute) and skips violations with a diagnostic.

pub mod git_pull;
pub mod sys_stats;

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::domain::plugin::{CommandPlugin, PluginError, PluginMetadata, PluginOutput};

pub use git_pull::GitPullPlugin;
pub use sys_stats::SysStatsPlugin;

/// Registry mapping plugin codes to implementations.
pub struct PluginRegistry {
    plugins: HashMap<String, Arc<dyn CommandPlugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self {
            plugins: HashMap::new(),
        }
    }

    /// Registry preloaded with the built-in operator plugins.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(GitPullPlugin::new(None)));
        registry.register(Arc::new(SysStatsPlugin::new()));
        registry
    }

    /// Register one plugin. Invalid metadata or a duplicate code skips the
    /// plugin with a diagnostic instead of failing startup.
    pub fn register(&mut self, plugin: Arc<dyn CommandPlugin>) {
        let metadata = plugin.metadata().clone();

        if !metadata.is_valid() {
            warn!(
                name = %metadata.name,
                code = %metadata.code,
                "Skipped plugin: metadata must carry a name and a code"
            );
            return;
        }
        if self.plugins.contains_key(&metadata.code) {
            warn!(code = %metadata.code, "Skipped plugin: code already registered");
            return;
        }

        info!(name = %metadata.name, code = %metadata.code, "Loaded plugin");
        self.plugins.insert(metadata.code, plugin);
    }

    /// Metadata of every registered plugin, for dashboard rendering.
    pub fn list_metadata(&self) -> Vec<PluginMetadata> {
        self.plugins
            .values()
            .map(|plugin| plugin.metadata().clone())
            .collect()
    }

    /// Execute a plugin by code.
    pub async fn execute(&self, code: &str, args: &Value) -> Result<PluginOutput, PluginError> {
        let plugin = self
            .plugins
            .get(code)
            .ok_or_else(|| PluginError::NotFound(code.to_string()))?;
        plugin.execute(args).await
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}
