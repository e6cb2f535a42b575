// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Action Authorization Filter
//!
//! The sole authorization boundary for destructive operations. A
//! [`CommandPolicy`] checks every [`CommandRequest`] against the closed
//! lifecycle verb set and the configured service allowlist before the
//! process supervisor adapter is ever touched.
//!
//! The verb set and the allowlist are the full blast-radius control: the
//! policy is re-evaluated on every request and its result is never cached.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Lifecycle verbs the gateway will forward to the supervisor.
///
/// This is a closed set. It is never extended dynamically — adding a verb is
/// a code change, by design of the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Start,
    Stop,
    Restart,
}

impl Action {
    /// Parse a wire-format verb. Anything outside the closed set is `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "start" => Some(Self::Start),
            "stop" => Some(Self::Stop),
            "restart" => Some(Self::Restart),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire-format command submission. The `action` field stays a raw string so
/// that out-of-set verbs produce a structured policy rejection instead of a
/// deserialization error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRequest {
    pub action: String,
    pub service: String,
}

/// A command that has passed the authorization filter and may be handed to
/// the supervisor adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedCommand {
    pub action: Action,
    pub service: String,
}

/// Policy rejections. Terminal for the request; never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandRejection {
    #[error("action '{0}' is not a recognised lifecycle verb")]
    InvalidAction(String),

    #[error("service '{0}' is not in the allowlist")]
    ServiceNotAllowed(String),
}

/// Fixed set of service names eligible for remote control.
///
/// Exact-match only: no wildcards, no prefix matching, no normalisation.
#[derive(Debug, Clone, Default)]
pub struct ServiceAllowlist {
    names: BTreeSet<String>,
}

impl ServiceAllowlist {
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// The filter itself. Stateless apart from the configured allowlist;
/// constructed once at startup and shared across handlers.
#[derive(Debug, Clone)]
pub struct CommandPolicy {
    allowlist: ServiceAllowlist,
}

impl CommandPolicy {
    pub fn new(allowlist: ServiceAllowlist) -> Self {
        Self { allowlist }
    }

    pub fn allowlist(&self) -> &ServiceAllowlist {
        &self.allowlist
    }

    /// Authorize one command submission.
    ///
    /// Checks run in order: verb first, then allowlist membership. The verb
    /// check does not consult the allowlist, so an out-of-set action is
    /// rejected identically whether or not the target service is allowed.
    pub fn authorize(&self, request: &CommandRequest) -> Result<AuthorizedCommand, CommandRejection> {
        let action = Action::parse(&request.action)
            .ok_or_else(|| CommandRejection::InvalidAction(request.action.clone()))?;

        if !self.allowlist.contains(&request.service) {
            return Err(CommandRejection::ServiceNotAllowed(request.service.clone()));
        }

        Ok(AuthorizedCommand {
            action,
            service: request.service.clone(),
        })
    }
}
