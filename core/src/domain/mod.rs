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

pub mod request;
pub mod source;
pub mod credentials;
pub mod provision;
pub mod repository;

pub use provision::ProvisionError;
pub use request::{RequestState, TransferRequest};
pub use source::SourceLocation;
