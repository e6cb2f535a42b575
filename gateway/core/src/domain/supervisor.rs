// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle state of a supervised process, as reported by the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    Running,
    Stopped,
    Errored,
    /// The supervisor reported a state outside the canonical three
    /// (e.g. mid-launch). Carried through rather than dropped.
    Unknown,
}

/// Point-in-time status of one supervised process.
///
/// Monitoring data is best-effort: a supervisor that returns no memory/cpu
/// sample for a process yields zeros here rather than failing the whole
/// health response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub name: String,
    pub status: ServiceState,
    /// Milliseconds since the process was (re)started.
    #[serde(rename = "uptime")]
    pub uptime_ms: u64,
    /// Resident memory in bytes; zero when the supervisor has no sample.
    #[serde(rename = "memory")]
    pub memory_bytes: u64,
    /// CPU usage percentage; zero when the supervisor has no sample.
    #[serde(rename = "cpu")]
    pub cpu_percent: f64,
}

/// Errors surfaced by a supervisor adapter call.
///
/// These are recovered into structured failure responses — they never crash
/// a handler and are never retried automatically.
#[derive(Debug, Clone, Error)]
pub enum SupervisorError {
    #[error("process '{0}' is not known to the supervisor")]
    UnknownProcess(String),

    #[error("supervisor unreachable: {0}")]
    Unreachable(String),

    #[error("supervisor command failed: {0}")]
    CommandFailed(String),

    #[error("supervisor call timed out after {0} seconds")]
    Timeout(u64),

    #[error("malformed supervisor output: {0}")]
    Malformed(String),
}

/// The core abstraction over the external process supervisor.
///
/// Implementations adapt a concrete supervisor (pm2 in production, mocks in
/// tests) to the gateway. Every call must be bounded by a timeout so no
/// request can block the scheduler indefinitely.
#[async_trait]
pub trait ProcessSupervisor: Send + Sync {
    /// List all processes known to the supervisor.
    async fn list(&self) -> Result<Vec<ServiceStatus>, SupervisorError>;

    /// Start a named process.
    async fn start(&self, name: &str) -> Result<(), SupervisorError>;

    /// Stop a named process.
    async fn stop(&self, name: &str) -> Result<(), SupervisorError>;

    /// Restart a named process.
    async fn restart(&self, name: &str) -> Result<(), SupervisorError>;
}
