// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod token;
pub mod middleware;
pub mod audit;

pub use middleware::{require_trust, TrustState};
pub use token::BearerTokenVerifier;
