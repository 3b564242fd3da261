// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Account directory adapters.
//!
//! The production directory is the pure-ftpd MySQL backend: one `users` row
//! per account with a hashed password, fixed uid/gid, home directory, and an
//! enabled flag. Creation is idempotent — an existing row is left untouched,
//! which also keeps the stored secret stable across re-provisioning.

use async_trait::async_trait;
use sha2::{Digest, Sha512};
use sqlx::mysql::MySqlPoolOptions;
use sqlx::{MySqlPool, Row};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

use crate::domain::provision::{AccountDirectory, ProvisionError};

/// How secrets are stored in the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashScheme {
    Cleartext,
    Sha512,
}

impl HashScheme {
    pub fn parse(name: &str) -> Result<Self, ProvisionError> {
        match name.to_ascii_lowercase().as_str() {
            "cleartext" => Ok(Self::Cleartext),
            "sha512" => Ok(Self::Sha512),
            other => Err(ProvisionError::UnsupportedHashScheme(other.to_string())),
        }
    }

    pub fn hash(self, secret: &str) -> String {
        match self {
            Self::Cleartext => secret.to_string(),
            Self::Sha512 => hex::encode(Sha512::digest(secret.as_bytes())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AccountRecord {
    pub name: String,
    pub secret: String,
    pub uid: u32,
    pub gid: u32,
    pub homedir: String,
    pub enabled: bool,
}

// ============================================================================
// MySQL (pure-ftpd backend)
// ============================================================================

pub struct MySqlAccountDirectory {
    pool: MySqlPool,
    scheme: HashScheme,
    uid: u32,
    gid: u32,
}

impl MySqlAccountDirectory {
    pub async fn connect(
        url: &str,
        scheme: HashScheme,
        uid: u32,
        gid: u32,
    ) -> Result<Self, ProvisionError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(4)
            .connect(url)
            .await
            .map_err(|e| ProvisionError::AccountStoreUnavailable(e.to_string()))?;
        Ok(Self {
            pool,
            scheme,
            uid,
            gid,
        })
    }

    pub async fn fetch(&self, name: &str) -> Result<Option<AccountRecord>, ProvisionError> {
        let row = sqlx::query(
            "SELECT User, Password, Uid, Gid, Dir, Status FROM users WHERE User = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ProvisionError::AccountStoreUnavailable(e.to_string()))?;
        Ok(row.map(|r| AccountRecord {
            name: r.get::<String, _>("User"),
            secret: r.get::<String, _>("Password"),
            uid: r.get::<i64, _>("Uid") as u32,
            gid: r.get::<i64, _>("Gid") as u32,
            homedir: r.get::<String, _>("Dir"),
            enabled: r.get::<String, _>("Status") == "1",
        }))
    }

    /// Rotate the stored secret of an existing account. Operational tooling
    /// only; the orchestrator never rewrites secrets.
    pub async fn set_secret(&self, name: &str, secret: &str) -> Result<(), ProvisionError> {
        let result = sqlx::query("UPDATE users SET Password = ? WHERE User = ?")
            .bind(self.scheme.hash(secret))
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|e| ProvisionError::AccountStoreUnavailable(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(ProvisionError::NotFound(name.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl AccountDirectory for MySqlAccountDirectory {
    async fn existing_secret(&self, name: &str) -> Result<Option<String>, ProvisionError> {
        Ok(self.fetch(name).await?.map(|r| r.secret))
    }

    async fn ensure_account(
        &self,
        name: &str,
        secret: &str,
        homedir: &Path,
    ) -> Result<(), ProvisionError> {
        if self.existing_secret(name).await?.is_some() {
            debug!(name, "account already exists, skipping creation");
            return Ok(());
        }
        sqlx::query(
            "INSERT INTO users (User, Password, Uid, Gid, Dir, Status) VALUES (?, ?, ?, ?, ?, '1')",
        )
        .bind(name)
        .bind(self.scheme.hash(secret))
        .bind(self.uid)
        .bind(self.gid)
        .bind(homedir.to_string_lossy().as_ref())
        .execute(&self.pool)
        .await
        .map_err(|e| ProvisionError::AccountStoreUnavailable(e.to_string()))?;
        info!(name, homedir = %homedir.display(), "ftp account created");
        Ok(())
    }
}

// ============================================================================
// In-Memory (tests, simulation)
// ============================================================================

#[derive(Clone)]
pub struct InMemoryAccountDirectory {
    scheme: HashScheme,
    uid: u32,
    gid: u32,
    accounts: Arc<RwLock<HashMap<String, AccountRecord>>>,
}

impl InMemoryAccountDirectory {
    pub fn new(scheme: HashScheme) -> Self {
        Self {
            scheme,
            uid: 2001,
            gid: 2001,
            accounts: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn get(&self, name: &str) -> Option<AccountRecord> {
        self.accounts.read().unwrap().get(name).cloned()
    }
}

#[async_trait]
impl AccountDirectory for InMemoryAccountDirectory {
    async fn existing_secret(&self, name: &str) -> Result<Option<String>, ProvisionError> {
        Ok(self.get(name).map(|r| r.secret))
    }

    async fn ensure_account(
        &self,
        name: &str,
        secret: &str,
        homedir: &Path,
    ) -> Result<(), ProvisionError> {
        let mut accounts = self.accounts.write().unwrap();
        if accounts.contains_key(name) {
            return Ok(());
        }
        accounts.insert(
            name.to_string(),
            AccountRecord {
                name: name.to_string(),
                secret: self.scheme.hash(secret),
                uid: self.uid,
                gid: self.gid,
                homedir: homedir.to_string_lossy().into_owned(),
                enabled: true,
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_parsing_rejects_unknown_names() {
        assert_eq!(HashScheme::parse("sha512").unwrap(), HashScheme::Sha512);
        assert_eq!(
            HashScheme::parse("Cleartext").unwrap(),
            HashScheme::Cleartext
        );
        assert!(matches!(
            HashScheme::parse("md5crypt"),
            Err(ProvisionError::UnsupportedHashScheme(s)) if s == "md5crypt"
        ));
    }

    #[test]
    fn sha512_scheme_hashes_and_cleartext_does_not() {
        assert_eq!(HashScheme::Cleartext.hash("abc"), "abc");
        let hashed = HashScheme::Sha512.hash("abc");
        assert_ne!(hashed, "abc");
        assert_eq!(hashed.len(), 128);
    }

    #[tokio::test]
    async fn create_is_idempotent_and_keeps_the_first_secret() {
        let dir = InMemoryAccountDirectory::new(HashScheme::Sha512);
        let home = Path::new("/data/ftp_a_b");
        dir.ensure_account("ftp_a_b", "first", home).await.unwrap();
        let stored = dir.existing_secret("ftp_a_b").await.unwrap().unwrap();
        dir.ensure_account("ftp_a_b", "second", home).await.unwrap();
        assert_eq!(
            dir.existing_secret("ftp_a_b").await.unwrap().unwrap(),
            stored
        );
    }
}
