// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Request store implementations.
//!
//! SQLite for durable operation (the store must survive restarts), an
//! in-memory map for tests and simulation. Both enforce create-fails-if-
//! exists, which is the admission deduplication guarantee.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::domain::repository::{RepositoryError, RequestRepository};
use crate::domain::request::{RequestState, TransferRequest};

// ============================================================================
// In-Memory
// ============================================================================

#[derive(Clone, Default)]
pub struct InMemoryRequestRepository {
    requests: Arc<RwLock<HashMap<String, TransferRequest>>>,
}

impl InMemoryRequestRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RequestRepository for InMemoryRequestRepository {
    async fn create(&self, request: &TransferRequest) -> Result<(), RepositoryError> {
        let mut requests = self.requests.write().unwrap();
        if requests.contains_key(&request.id) {
            return Err(RepositoryError::AlreadyExists(request.id.clone()));
        }
        requests.insert(request.id.clone(), request.clone());
        Ok(())
    }

    async fn update(
        &self,
        id: &str,
        state: RequestState,
        info: &serde_json::Value,
    ) -> Result<(), RepositoryError> {
        let mut requests = self.requests.write().unwrap();
        let record = requests
            .get_mut(id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        record.state = state;
        record.info = info.clone();
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<TransferRequest>, RepositoryError> {
        Ok(self.requests.read().unwrap().get(id).cloned())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

// ============================================================================
// SQLite
// ============================================================================

pub struct SqliteRequestRepository {
    pool: SqlitePool,
}

impl SqliteRequestRepository {
    /// Open (and create if missing) the store at `path`; `:memory:` gives
    /// the ephemeral test-mode store.
    pub async fn connect(path: &str) -> Result<Self, RepositoryError> {
        let pool = if path == ":memory:" {
            // A single connection keeps every handle on the same in-memory DB.
            SqlitePoolOptions::new()
                .max_connections(1)
                .connect("sqlite::memory:")
                .await
        } else {
            let options = SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true);
            SqlitePoolOptions::new().connect_with(options).await
        }
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS requests (
                id TEXT PRIMARY KEY,
                owner_contact TEXT NOT NULL,
                source_path TEXT NOT NULL,
                validity_days INTEGER NOT NULL,
                state TEXT NOT NULL,
                info TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        Ok(Self { pool })
    }

    fn row_to_request(row: sqlx::sqlite::SqliteRow) -> Result<TransferRequest, RepositoryError> {
        let state: String = row.get("state");
        let info: String = row.get("info");
        Ok(TransferRequest {
            id: row.get("id"),
            owner_contact: row.get("owner_contact"),
            source_path: row.get("source_path"),
            validity_days: row.get::<i64, _>("validity_days") as u32,
            state: state
                .parse()
                .map_err(|e: crate::domain::request::UnknownState| {
                    RepositoryError::Storage(e.to_string())
                })?,
            info: serde_json::from_str(&info)
                .map_err(|e| RepositoryError::Storage(e.to_string()))?,
            created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
            updated_at: parse_timestamp(&row.get::<String, _>("updated_at"))?,
        })
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Storage(format!("bad timestamp '{raw}': {e}")))
}

#[async_trait]
impl RequestRepository for SqliteRequestRepository {
    async fn create(&self, request: &TransferRequest) -> Result<(), RepositoryError> {
        let info = serde_json::to_string(&request.info)
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;
        let result = sqlx::query(
            "INSERT INTO requests
                (id, owner_contact, source_path, validity_days, state, info, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&request.id)
        .bind(&request.owner_contact)
        .bind(&request.source_path)
        .bind(request.validity_days as i64)
        .bind(request.state.as_str())
        .bind(info)
        .bind(request.created_at.to_rfc3339())
        .bind(request.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await;
        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db))
                if matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation) =>
            {
                Err(RepositoryError::AlreadyExists(request.id.clone()))
            }
            Err(e) => Err(RepositoryError::Storage(e.to_string())),
        }
    }

    async fn update(
        &self,
        id: &str,
        state: RequestState,
        info: &serde_json::Value,
    ) -> Result<(), RepositoryError> {
        let info = serde_json::to_string(info)
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;
        let result = sqlx::query(
            "UPDATE requests SET state = ?, info = ?, updated_at = ? WHERE id = ?",
        )
        .bind(state.as_str())
        .bind(info)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<TransferRequest>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM requests WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;
        row.map(Self::row_to_request).transpose()
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| RepositoryError::Storage(e.to_string()))
    }
}
