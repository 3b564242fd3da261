// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Provisioning capability contracts.
//!
//! The orchestrator is polymorphic over {size probe, space checker, data
//! mover, account directory}; production adapters shell out to ssh/rsync and
//! talk to the pure-ftpd backend, while simulation substitutes deterministic
//! implementations behind the same traits.

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

use crate::domain::repository::RepositoryError;
use crate::domain::request::RequestState;
use crate::domain::source::{SourceLocation, SourceParseError};

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("a request with id '{id}' already exists (current state: {state})")]
    DuplicateRequest { id: String, state: RequestState },

    #[error(transparent)]
    InvalidSource(#[from] SourceParseError),

    #[error("validity_days must be a positive number of days")]
    InvalidValidity,

    #[error("insufficient space: source is {required} bytes but only {available} bytes are free")]
    InsufficientSpace { required: u64, available: u64 },

    #[error("size probe failed: {0}")]
    SizeProbeFailed(String),

    #[error("local link failed: {0}")]
    LocalLinkFailed(String),

    #[error("transfer failed: {0}")]
    TransferFailed(String),

    #[error("transfer tool not available: {0}")]
    ToolNotAvailable(String),

    #[error("account store unavailable: {0}")]
    AccountStoreUnavailable(String),

    #[error("unsupported password hash scheme '{0}'")]
    UnsupportedHashScheme(String),

    #[error("no request found for id '{0}'")]
    NotFound(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("secret encryption failed: {0}")]
    Crypto(String),

    #[error("{0}")]
    Internal(String),
}

/// Byte size of the data behind a source descriptor.
#[async_trait]
pub trait SizeProbe: Send + Sync {
    async fn source_size_bytes(&self, source: &SourceLocation) -> Result<u64, ProvisionError>;
}

/// Free capacity at the staging root.
#[async_trait]
pub trait SpaceChecker: Send + Sync {
    async fn available_bytes(&self, mount: &Path) -> Result<u64, ProvisionError>;
}

/// Moves the validated source into a per-request destination directory.
#[async_trait]
pub trait DataMover: Send + Sync {
    async fn transfer(&self, source: &SourceLocation, dest: &Path) -> Result<(), ProvisionError>;
}

/// System of record for transfer-protocol accounts.
///
/// `ensure_account` is idempotent: creating a name that already exists is a
/// no-op and must not rewrite the stored secret.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// The stored secret field for an existing account, if any.
    async fn existing_secret(&self, name: &str) -> Result<Option<String>, ProvisionError>;

    async fn ensure_account(
        &self,
        name: &str,
        secret: &str,
        homedir: &Path,
    ) -> Result<(), ProvisionError>;
}
