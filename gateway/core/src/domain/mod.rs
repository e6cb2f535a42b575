// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Mod
//!
//! Provides mod functionality for the system.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Implements mod

pub mod credential;
pub mod trust;
pub mod command;
pub mod supervisor;
pub mod node;
pub mod repository;
pub mod plugin;
pub mod gateway_config;
