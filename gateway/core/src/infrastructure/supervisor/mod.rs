// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod pm2;

pub use pm2::Pm2Supervisor;
