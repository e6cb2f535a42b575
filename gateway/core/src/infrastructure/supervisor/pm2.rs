// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # pm2 Supervisor Adapter
//!
//! Adapts the pm2 process manager to [`ProcessSupervisor`] by shelling out
//! to the pm2 binary: `pm2 jlist` for status, `pm2 start|stop|restart
//! <name>` for lifecycle commands.
//!
//! Monitoring data in `jlist` output is best-effort — pm2 omits the `monit`
//! block for processes it has no sample for — so absent memory/cpu values
//! map to zero instead of failing the whole listing. Every call is bounded
//! by the configured timeout.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::domain::gateway_config::SupervisorConfig;
use crate::domain::supervisor::{ProcessSupervisor, ServiceState, ServiceStatus, SupervisorError};

pub struct Pm2Supervisor {
    bin: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct Pm2Process {
    name: String,
    pm2_env: Pm2Env,
    #[serde(default)]
    monit: Option<Pm2Monit>,
}

#[derive(Debug, Deserialize)]
struct Pm2Env {
    status: String,
    /// Epoch milliseconds of the last (re)start.
    #[serde(default)]
    pm_uptime: Option<i64>,
}

#[derive(Debug, Deserialize, Default)]
struct Pm2Monit {
    #[serde(default)]
    memory: u64,
    #[serde(default)]
    cpu: f64,
}

impl Pm2Supervisor {
    pub fn new(bin: impl Into<String>, timeout: Duration) -> Self {
        Self {
            bin: bin.into(),
            timeout,
        }
    }

    pub fn from_config(config: &SupervisorConfig) -> Self {
        Self::new(config.pm2_bin.clone(), config.command_timeout)
    }

    async fn run(&self, args: &[&str]) -> Result<std::process::Output, SupervisorError> {
        debug!(bin = %self.bin, ?args, "Invoking supervisor");
        let mut command = Command::new(&self.bin);
        command.args(args);

        match tokio::time::timeout(self.timeout, command.output()).await {
            Err(_) => Err(SupervisorError::Timeout(self.timeout.as_secs())),
            Ok(Err(e)) => Err(SupervisorError::Unreachable(e.to_string())),
            Ok(Ok(output)) => Ok(output),
        }
    }

    fn check_exit(name: &str, output: &std::process::Output) -> Result<(), SupervisorError> {
        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.to_ascii_lowercase().contains("not found") {
            Err(SupervisorError::UnknownProcess(name.to_string()))
        } else {
            Err(SupervisorError::CommandFailed(stderr.trim().to_string()))
        }
    }
}

/// Map one pm2 jlist entry to the wire status, defaulting absent monitoring
/// samples to zero.
fn map_process(process: Pm2Process, now_ms: i64) -> ServiceStatus {
    let monit = process.monit.unwrap_or_default();
    let uptime_ms = process
        .pm2_env
        .pm_uptime
        .map(|started| (now_ms - started).max(0) as u64)
        .unwrap_or(0);

    ServiceStatus {
        name: process.name,
        status: map_state(&process.pm2_env.status),
        uptime_ms,
        memory_bytes: monit.memory,
        cpu_percent: monit.cpu,
    }
}

fn map_state(status: &str) -> ServiceState {
    match status {
        "online" => ServiceState::Running,
        "stopped" | "stopping" => ServiceState::Stopped,
        "errored" => ServiceState::Errored,
        _ => ServiceState::Unknown,
    }
}

fn parse_jlist(stdout: &[u8], now_ms: i64) -> Result<Vec<ServiceStatus>, SupervisorError> {
    let processes: Vec<Pm2Process> = serde_json::from_slice(stdout)
        .map_err(|e| SupervisorError::Malformed(e.to_string()))?;
    Ok(processes
        .into_iter()
        .map(|process| map_process(process, now_ms))
        .collect())
}

#[async_trait]
impl ProcessSupervisor for Pm2Supervisor {
    async fn list(&self) -> Result<Vec<ServiceStatus>, SupervisorError> {
        let output = self.run(&["jlist"]).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SupervisorError::Unreachable(stderr.trim().to_string()));
        }
        parse_jlist(&output.stdout, Utc::now().timestamp_millis())
    }

    async fn start(&self, name: &str) -> Result<(), SupervisorError> {
        let output = self.run(&["start", name]).await?;
        Self::check_exit(name, &output)
    }

    async fn stop(&self, name: &str) -> Result<(), SupervisorError> {
        let output = self.run(&["stop", name]).await?;
        Self::check_exit(name, &output)
    }

    async fn restart(&self, name: &str) -> Result<(), SupervisorError> {
        let output = self.run(&["restart", name]).await?;
        Self::check_exit(name, &output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW_MS: i64 = 1_700_000_120_000;

    #[test]
    fn test_parse_jlist_full_entry() {
        let payload = serde_json::json!([{
            "name": "api-server",
            "pm2_env": { "status": "online", "pm_uptime": 1_700_000_000_000i64 },
            "monit": { "memory": 52_428_800u64, "cpu": 1.5 }
        }]);
        let services = parse_jlist(payload.to_string().as_bytes(), NOW_MS).unwrap();
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].name, "api-server");
        assert_eq!(services[0].status, ServiceState::Running);
        assert_eq!(services[0].uptime_ms, 120_000);
        assert_eq!(services[0].memory_bytes, 52_428_800);
        assert!((services[0].cpu_percent - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_jlist_missing_monit_defaults_to_zero() {
        let payload = serde_json::json!([{
            "name": "background-worker",
            "pm2_env": { "status": "online", "pm_uptime": 1_700_000_000_000i64 }
        }]);
        let services = parse_jlist(payload.to_string().as_bytes(), NOW_MS).unwrap();
        assert_eq!(services[0].memory_bytes, 0);
        assert_eq!(services[0].cpu_percent, 0.0);
    }

    #[test]
    fn test_parse_jlist_missing_uptime_defaults_to_zero() {
        let payload = serde_json::json!([{
            "name": "background-worker",
            "pm2_env": { "status": "stopped" }
        }]);
        let services = parse_jlist(payload.to_string().as_bytes(), NOW_MS).unwrap();
        assert_eq!(services[0].uptime_ms, 0);
        assert_eq!(services[0].status, ServiceState::Stopped);
    }

    #[test]
    fn test_parse_jlist_clamps_future_uptime() {
        // pm2 clock skew must not underflow the uptime.
        let payload = serde_json::json!([{
            "name": "api-server",
            "pm2_env": { "status": "online", "pm_uptime": NOW_MS + 5_000 }
        }]);
        let services = parse_jlist(payload.to_string().as_bytes(), NOW_MS).unwrap();
        assert_eq!(services[0].uptime_ms, 0);
    }

    #[test]
    fn test_state_mapping() {
        assert_eq!(map_state("online"), ServiceState::Running);
        assert_eq!(map_state("stopped"), ServiceState::Stopped);
        assert_eq!(map_state("stopping"), ServiceState::Stopped);
        assert_eq!(map_state("errored"), ServiceState::Errored);
        assert_eq!(map_state("launching"), ServiceState::Unknown);
    }

    #[test]
    fn test_parse_jlist_rejects_malformed_output() {
        assert!(matches!(
            parse_jlist(b"pm2 daemon banner", NOW_MS),
            Err(SupervisorError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_binary_is_unreachable() {
        let supervisor = Pm2Supervisor::new(
            "/nonexistent/path/to/pm2-binary",
            Duration::from_secs(1),
        );
        assert!(matches!(
            supervisor.list().await,
            Err(SupervisorError::Unreachable(_))
        ));
    }
}
