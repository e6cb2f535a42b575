// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::domain::command::{
    Action, AuthorizedCommand, CommandPolicy, CommandRejection, CommandRequest,
};
use crate::domain::supervisor::{ProcessSupervisor, SupervisorError};
use crate::domain::trust::Principal;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Rejected(#[from] CommandRejection),

    #[error(transparent)]
    Supervisor(#[from] SupervisorError),
}

/// Command submission: authorization filter, then supervisor dispatch.
///
/// The policy runs on every submission — never cached — and the adapter is
/// only reached by commands that passed it. Both the rejection and the
/// executed command are logged with the authenticated principal for audit
/// review.
pub struct CommandService {
    supervisor: Arc<dyn ProcessSupervisor>,
    policy: CommandPolicy,
}

impl CommandService {
    pub fn new(supervisor: Arc<dyn ProcessSupervisor>, policy: CommandPolicy) -> Self {
        Self { supervisor, policy }
    }

    pub async fn submit(
        &self,
        principal: &Principal,
        request: &CommandRequest,
    ) -> Result<AuthorizedCommand, CommandError> {
        let command = match self.policy.authorize(request) {
            Ok(command) => command,
            Err(rejection) => {
                warn!(
                    principal = %principal.subject,
                    action = %request.action,
                    service = %request.service,
                    reason = %rejection,
                    "Command rejected by authorization filter"
                );
                return Err(rejection.into());
            }
        };

        let result = match command.action {
            Action::Start => self.supervisor.start(&command.service).await,
            Action::Stop => self.supervisor.stop(&command.service).await,
            Action::Restart => self.supervisor.restart(&command.service).await,
        };

        match result {
            Ok(()) => {
                info!(
                    principal = %principal.subject,
                    action = %command.action,
                    service = %command.service,
                    "Command executed"
                );
                Ok(command)
            }
            Err(error) => {
                warn!(
                    principal = %principal.subject,
                    action = %command.action,
                    service = %command.service,
                    error = %error,
                    "Supervisor call failed"
                );
                Err(error.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::command::ServiceAllowlist;
    use crate::domain::supervisor::ServiceStatus;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // Mock supervisor that records call counts per verb.
    #[derive(Default)]
    struct CountingSupervisor {
        starts: AtomicUsize,
        stops: AtomicUsize,
        restarts: AtomicUsize,
        fail_with: Option<SupervisorError>,
    }

    impl CountingSupervisor {
        fn total_calls(&self) -> usize {
            self.starts.load(Ordering::SeqCst)
                + self.stops.load(Ordering::SeqCst)
                + self.restarts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ProcessSupervisor for CountingSupervisor {
        async fn list(&self) -> Result<Vec<ServiceStatus>, SupervisorError> {
            Ok(vec![])
        }

        async fn start(&self, _name: &str) -> Result<(), SupervisorError> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            self.fail_with.clone().map_or(Ok(()), Err)
        }

        async fn stop(&self, _name: &str) -> Result<(), SupervisorError> {
            self.stops.fetch_add(1, Ordering::SeqCst);
            self.fail_with.clone().map_or(Ok(()), Err)
        }

        async fn restart(&self, _name: &str) -> Result<(), SupervisorError> {
            self.restarts.fetch_add(1, Ordering::SeqCst);
            self.fail_with.clone().map_or(Ok(()), Err)
        }
    }

    fn service_with(supervisor: Arc<CountingSupervisor>) -> CommandService {
        CommandService::new(
            supervisor,
            CommandPolicy::new(ServiceAllowlist::new(["api-server", "background-worker"])),
        )
    }

    fn request(action: &str, service: &str) -> CommandRequest {
        CommandRequest {
            action: action.to_string(),
            service: service.to_string(),
        }
    }

    fn principal() -> Principal {
        Principal::new("fleet-manager")
    }

    #[tokio::test]
    async fn test_allowed_restart_invokes_adapter_exactly_once() {
        let supervisor = Arc::new(CountingSupervisor::default());
        let service = service_with(supervisor.clone());

        let command = service
            .submit(&principal(), &request("restart", "api-server"))
            .await
            .unwrap();

        assert_eq!(command.action, Action::Restart);
        assert_eq!(command.service, "api-server");
        assert_eq!(supervisor.restarts.load(Ordering::SeqCst), 1);
        assert_eq!(supervisor.total_calls(), 1);
    }

    #[tokio::test]
    async fn test_invalid_action_never_reaches_adapter() {
        let supervisor = Arc::new(CountingSupervisor::default());
        let service = service_with(supervisor.clone());

        let result = service
            .submit(&principal(), &request("delete", "api-server"))
            .await;

        assert!(matches!(
            result,
            Err(CommandError::Rejected(CommandRejection::InvalidAction(_)))
        ));
        assert_eq!(supervisor.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_unlisted_service_never_reaches_adapter() {
        let supervisor = Arc::new(CountingSupervisor::default());
        let service = service_with(supervisor.clone());

        let result = service
            .submit(&principal(), &request("stop", "postgres"))
            .await;

        assert!(matches!(
            result,
            Err(CommandError::Rejected(CommandRejection::ServiceNotAllowed(_)))
        ));
        assert_eq!(supervisor.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_supervisor_failure_is_surfaced_not_panicked() {
        let supervisor = Arc::new(CountingSupervisor {
            fail_with: Some(SupervisorError::UnknownProcess("api-server".to_string())),
            ..Default::default()
        });
        let service = service_with(supervisor);

        let result = service
            .submit(&principal(), &request("start", "api-server"))
            .await;

        assert!(matches!(
            result,
            Err(CommandError::Supervisor(SupervisorError::UnknownProcess(_)))
        ));
    }
}
