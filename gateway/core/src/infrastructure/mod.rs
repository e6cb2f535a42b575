// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod keystore;
pub mod trust;
pub mod supervisor;
pub mod repositories;
pub mod node_client;
pub mod tls;
pub mod plugins;
