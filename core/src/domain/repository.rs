// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Request store contract.
//!
//! One repository for the `TransferRequest` aggregate, implemented in
//! `crate::infrastructure::repositories` (SQLite for durable operation,
//! in-memory for tests and simulation). `create` failing on an existing key
//! is the admission-time deduplication guarantee.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::request::{RequestState, TransferRequest};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("a record with id '{0}' already exists")]
    AlreadyExists(String),

    #[error("no record found for id '{0}'")]
    NotFound(String),

    #[error("request store error: {0}")]
    Storage(String),
}

#[async_trait]
pub trait RequestRepository: Send + Sync {
    /// Insert a new record; fails with `AlreadyExists` if the id is taken.
    async fn create(&self, request: &TransferRequest) -> Result<(), RepositoryError>;

    /// Replace state and info of an existing record in one write.
    async fn update(
        &self,
        id: &str,
        state: RequestState,
        info: &serde_json::Value,
    ) -> Result<(), RepositoryError>;

    async fn get(&self, id: &str) -> Result<Option<TransferRequest>, RepositoryError>;

    /// Cheap reachability check for health reporting.
    async fn ping(&self) -> Result<(), RepositoryError>;
}
