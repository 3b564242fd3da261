// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Lib
//!
//! Provides the tempoftp core: the provisioning orchestrator, its durable
//! request store, and the adapters it drives (sizing probe, space checker,
//! data mover, account directory).
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Provision short-lived FTP transfer accounts

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
