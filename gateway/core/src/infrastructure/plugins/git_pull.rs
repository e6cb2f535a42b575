// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;

use crate::domain::plugin::{CommandPlugin, PluginError, PluginMetadata, PluginOutput};

/// Pulls the latest code in a target repository directory.
///
/// The directory comes from the `path` argument when provided, otherwise
/// from the configured default (the manager's working directory).
pub struct GitPullPlugin {
    metadata: PluginMetadata,
    default_dir: Option<PathBuf>,
}

impl GitPullPlugin {
    pub fn new(default_dir: Option<PathBuf>) -> Self {
        Self {
            metadata: PluginMetadata {
                name: "Git Pull".to_string(),
                code: "git-pull".to_string(),
                description: "Pulls latest code from repository".to_string(),
            },
            default_dir,
        }
    }

    fn target_dir(&self, args: &Value) -> PathBuf {
        if let Some(path) = args.get("path").and_then(Value::as_str) {
            return PathBuf::from(path);
        }
        self.default_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[async_trait]
impl CommandPlugin for GitPullPlugin {
    fn metadata(&self) -> &PluginMetadata {
        &self.metadata
    }

    async fn execute(&self, args: &Value) -> Result<PluginOutput, PluginError> {
        let dir = self.target_dir(args);

        let output = Command::new("git")
            .arg("pull")
            .current_dir(&dir)
            .output()
            .await
            .map_err(|e| PluginError::ExecutionFailed(format!("git failed to spawn: {}", e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if !output.status.success() {
            return Err(PluginError::ExecutionFailed(format!(
                "git pull failed in {:?}: {}",
                dir, stderr
            )));
        }

        Ok(PluginOutput {
            output: if stdout.is_empty() {
                "Already up to date.".to_string()
            } else {
                stdout
            },
            error: if stderr.is_empty() { None } else { Some(stderr) },
        })
    }
}
