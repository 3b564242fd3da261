// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod accounts;
pub mod config;
pub mod crypto;
pub mod mover;
pub mod probe;
pub mod repositories;
pub mod simulation;

pub use config::ServiceConfig;
pub use crypto::SecretCipher;
