// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;

use crate::domain::plugin::{CommandPlugin, PluginError, PluginMetadata, PluginOutput};

/// Reports disk and memory usage of the manager host.
pub struct SysStatsPlugin {
    metadata: PluginMetadata,
}

impl SysStatsPlugin {
    pub fn new() -> Self {
        Self {
            metadata: PluginMetadata {
                name: "System Stats".to_string(),
                code: "sys-stats".to_string(),
                description: "Check Disk & RAM usage".to_string(),
            },
        }
    }

    async fn capture(command: &str, args: &[&str]) -> Result<String, PluginError> {
        let output = Command::new(command)
            .args(args)
            .output()
            .await
            .map_err(|e| PluginError::ExecutionFailed(format!("{} failed to spawn: {}", command, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(PluginError::ExecutionFailed(format!(
                "{} exited with {}: {}",
                command, output.status, stderr
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl Default for SysStatsPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandPlugin for SysStatsPlugin {
    fn metadata(&self) -> &PluginMetadata {
        &self.metadata
    }

    async fn execute(&self, _args: &Value) -> Result<PluginOutput, PluginError> {
        let disk_raw = Self::capture("df", &["-h", "/"]).await?;
        let memory_raw = Self::capture("free", &["-m"]).await?;

        let disk = disk_raw.lines().last().unwrap_or_default();
        let memory = memory_raw
            .lines()
            .find(|line| line.starts_with("Mem"))
            .unwrap_or_default();

        Ok(PluginOutput {
            output: format!("DISK:\n{}\nRAM:\n{}", disk, memory),
            error: None,
        })
    }
}
