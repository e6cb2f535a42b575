// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use std::sync::Arc;

use crate::domain::command::ServiceAllowlist;
use crate::domain::supervisor::{ProcessSupervisor, ServiceStatus, SupervisorError};

/// Health query over the supervisor adapter.
///
/// Depending on the deployment profile the snapshot covers every supervised
/// process or only the allowlisted ones. Partial monitoring data is handled
/// by the adapter (absent samples become zeros) — a degraded supervisor
/// never fails the whole response, only an unreachable one does.
pub struct HealthService {
    supervisor: Arc<dyn ProcessSupervisor>,
    /// None ⇒ expose every supervised process in the snapshot.
    visibility: Option<ServiceAllowlist>,
}

impl HealthService {
    pub fn new(supervisor: Arc<dyn ProcessSupervisor>, visibility: Option<ServiceAllowlist>) -> Self {
        Self {
            supervisor,
            visibility,
        }
    }

    pub async fn snapshot(&self) -> Result<Vec<ServiceStatus>, SupervisorError> {
        let services = self.supervisor.list().await?;
        match &self.visibility {
            Some(allowlist) => Ok(services
                .into_iter()
                .filter(|service| allowlist.contains(&service.name))
                .collect()),
            None => Ok(services),
        }
    }
}
