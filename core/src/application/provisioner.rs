// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Provisioning Orchestrator Application Service
//!
//! Composes the request store, credential generator, sizing probe, space
//! checker, data mover, and account directory into the
//! admission -> preparation -> transfer -> finalization pipeline.
//!
//! Admission validates and records the request synchronously; the remaining
//! steps run in a spawned task and publish progress through the request
//! store, which is the only coordination point between the pipeline and
//! status polls.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::domain::credentials::{derive_account_name, generate_secret, DEFAULT_SECRET_LEN};
use crate::domain::provision::{
    AccountDirectory, DataMover, ProvisionError, SizeProbe, SpaceChecker,
};
use crate::domain::repository::{RepositoryError, RequestRepository};
use crate::domain::request::{RequestState, TransferRequest};
use crate::domain::source::SourceLocation;
use crate::infrastructure::crypto::SecretCipher;

// ============================================================================
// Views
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct AdmitRequest {
    pub id: String,
    pub owner_contact: String,
    pub source_path: String,
    pub validity_days: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdmissionAck {
    pub id: String,
    pub state: RequestState,
}

/// Status as reported to pollers. The encrypted secret and account fields
/// appear only once the request is ready.
#[derive(Debug, Clone, Serialize)]
pub struct StatusView {
    pub id: String,
    pub state: RequestState,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validity_days: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthView {
    pub status: &'static str,
    pub database: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staging_free_bytes: Option<u64>,
}

// ============================================================================
// Service Trait
// ============================================================================

#[async_trait]
pub trait ProvisioningService: Send + Sync {
    /// Validate and record a request, then launch the pipeline without
    /// waiting for it.
    async fn admit(&self, request: AdmitRequest) -> Result<AdmissionAck, ProvisionError>;

    /// Current status of a request.
    async fn status(&self, id: &str) -> Result<StatusView, ProvisionError>;

    async fn health(&self) -> HealthView;
}

// ============================================================================
// Standard Implementation
// ============================================================================

/// Pipeline knobs that are not capabilities: where staging lives, how much
/// headroom to keep, and the advisory filesystem owner.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub staging_root: PathBuf,
    pub min_free_bytes: u64,
    /// `user:group` handed to chown; ownership adjustment is best-effort.
    pub owner: Option<String>,
}

pub struct StandardProvisioningService {
    repository: Arc<dyn RequestRepository>,
    size_probe: Arc<dyn SizeProbe>,
    space_checker: Arc<dyn SpaceChecker>,
    mover: Arc<dyn DataMover>,
    accounts: Arc<dyn AccountDirectory>,
    cipher: Arc<SecretCipher>,
    settings: PipelineSettings,
}

impl StandardProvisioningService {
    pub fn new(
        repository: Arc<dyn RequestRepository>,
        size_probe: Arc<dyn SizeProbe>,
        space_checker: Arc<dyn SpaceChecker>,
        mover: Arc<dyn DataMover>,
        accounts: Arc<dyn AccountDirectory>,
        cipher: Arc<SecretCipher>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            repository,
            size_probe,
            space_checker,
            mover,
            accounts,
            cipher,
            settings,
        }
    }

    fn pipeline(&self) -> Pipeline {
        Pipeline {
            repository: self.repository.clone(),
            size_probe: self.size_probe.clone(),
            space_checker: self.space_checker.clone(),
            mover: self.mover.clone(),
            accounts: self.accounts.clone(),
            settings: self.settings.clone(),
        }
    }
}

#[async_trait]
impl ProvisioningService for StandardProvisioningService {
    async fn admit(&self, request: AdmitRequest) -> Result<AdmissionAck, ProvisionError> {
        if request.validity_days == 0 {
            return Err(ProvisionError::InvalidValidity);
        }
        if let Some(existing) = self.repository.get(&request.id).await? {
            return Err(ProvisionError::DuplicateRequest {
                id: request.id,
                state: existing.state,
            });
        }
        let source = SourceLocation::parse(&request.source_path)?;

        let account = derive_account_name(&request.owner_contact);
        // Reuse the secret the account directory already holds for this
        // name; re-provisioning for the same owner must not rotate it.
        let secret = match self.accounts.existing_secret(&account).await? {
            Some(existing) => {
                debug!(account, "reusing secret of existing account");
                existing
            }
            None => generate_secret(DEFAULT_SECRET_LEN),
        };
        let secret_enc = self
            .cipher
            .encrypt(&secret)
            .map_err(|e| ProvisionError::Crypto(e.to_string()))?;

        let mut record = TransferRequest::new(
            &request.id,
            &request.owner_contact,
            &request.source_path,
            request.validity_days,
        );
        record.info = json!({
            "account": account,
            "secret_enc": secret_enc,
            "validity_days": request.validity_days,
            "message": "request received",
        });

        match self.repository.create(&record).await {
            Ok(()) => {}
            Err(RepositoryError::AlreadyExists(_)) => {
                // Lost an admission race; report the committed record's state.
                let state = self
                    .repository
                    .get(&request.id)
                    .await?
                    .map(|r| r.state)
                    .unwrap_or(RequestState::Received);
                return Err(ProvisionError::DuplicateRequest {
                    id: request.id,
                    state,
                });
            }
            Err(e) => return Err(e.into()),
        }

        info!(id = %record.id, %account, "request admitted, launching pipeline");
        let pipeline = self.pipeline();
        let job = PipelineJob {
            request_id: record.id.clone(),
            source,
            account,
            secret,
            validity_days: request.validity_days,
            info: record.info.clone(),
        };
        tokio::spawn(async move { pipeline.run(job).await });

        Ok(AdmissionAck {
            id: record.id,
            state: RequestState::Received,
        })
    }

    async fn status(&self, id: &str) -> Result<StatusView, ProvisionError> {
        let record = self
            .repository
            .get(id)
            .await?
            .ok_or_else(|| ProvisionError::NotFound(id.to_string()))?;
        let message = record.info["message"].as_str().unwrap_or("").to_string();
        if record.state == RequestState::Ready {
            Ok(StatusView {
                id: record.id,
                state: record.state,
                message,
                account: record.info["account"].as_str().map(str::to_string),
                secret: record.info["secret_enc"].as_str().map(str::to_string),
                validity_days: Some(record.validity_days),
            })
        } else {
            Ok(StatusView {
                id: record.id,
                state: record.state,
                message,
                account: None,
                secret: None,
                validity_days: None,
            })
        }
    }

    async fn health(&self) -> HealthView {
        let database = match self.repository.ping().await {
            Ok(()) => "ok",
            Err(e) => {
                warn!(%e, "request store unreachable");
                "error"
            }
        };
        let staging_free_bytes = self
            .space_checker
            .available_bytes(&self.settings.staging_root)
            .await
            .ok();
        HealthView {
            status: "ok",
            database,
            staging_free_bytes,
        }
    }
}

// ============================================================================
// Background Pipeline
// ============================================================================

struct PipelineJob {
    request_id: String,
    source: SourceLocation,
    account: String,
    /// Plaintext; lives only inside this task and is dropped with it.
    secret: String,
    validity_days: u32,
    info: serde_json::Value,
}

struct Pipeline {
    repository: Arc<dyn RequestRepository>,
    size_probe: Arc<dyn SizeProbe>,
    space_checker: Arc<dyn SpaceChecker>,
    mover: Arc<dyn DataMover>,
    accounts: Arc<dyn AccountDirectory>,
    settings: PipelineSettings,
}

impl Pipeline {
    async fn run(self, mut job: PipelineJob) {
        let id = job.request_id.clone();
        if let Err(err) = self.execute(&mut job).await {
            error!(%id, %err, "provisioning pipeline failed");
            job.info["message"] = json!(err.to_string());
            if let Err(store_err) = self
                .commit(&id, RequestState::Error, &job.info)
                .await
            {
                error!(%id, %store_err, "failed to record pipeline error");
            }
        }
    }

    async fn execute(&self, job: &mut PipelineJob) -> Result<(), ProvisionError> {
        let id = job.request_id.as_str();

        // 1. Space verification.
        job.info["message"] = json!("verifying available space");
        self.commit(id, RequestState::Preparing, &job.info).await?;

        let required = self.size_probe.source_size_bytes(&job.source).await?;
        let available = self
            .space_checker
            .available_bytes(&self.settings.staging_root)
            .await?;
        job.info["source_bytes"] = json!(required);
        job.info["staging_free_bytes"] = json!(available);
        debug!(%id, required, available, "space check");
        if required.saturating_add(self.settings.min_free_bytes) > available {
            return Err(ProvisionError::InsufficientSpace {
                required,
                available,
            });
        }

        // 2. Destination layout: <staging_root>/<account>/<request-id>.
        let homedir = self.settings.staging_root.join(&job.account);
        let dest = homedir.join(id);
        tokio::fs::create_dir_all(&dest).await.map_err(|e| {
            ProvisionError::Internal(format!(
                "failed to create destination {}: {e}",
                dest.display()
            ))
        })?;
        self.apply_ownership(&homedir).await;

        // 3. Data movement.
        job.info["message"] = json!(format!("copying data from {}", job.source));
        self.commit(id, RequestState::Transferring, &job.info)
            .await?;
        self.mover.transfer(&job.source, &dest).await?;

        // 4. Account creation (no-op if the name already exists).
        self.accounts
            .ensure_account(&job.account, &job.secret, &homedir)
            .await?;

        // 5. Done.
        job.info["message"] = json!(format!(
            "ready: account valid for {} days",
            job.validity_days
        ));
        self.commit(id, RequestState::Ready, &job.info).await?;
        info!(%id, account = %job.account, "request provisioned");
        Ok(())
    }

    /// One committed write per completed step: load, validate the
    /// transition, persist.
    async fn commit(
        &self,
        id: &str,
        next: RequestState,
        info: &serde_json::Value,
    ) -> Result<(), ProvisionError> {
        let mut record = self
            .repository
            .get(id)
            .await?
            .ok_or_else(|| ProvisionError::NotFound(id.to_string()))?;
        record
            .advance(next)
            .map_err(|e| ProvisionError::Internal(e.to_string()))?;
        self.repository.update(id, next, info).await?;
        Ok(())
    }

    /// Advisory: pure-ftpd wants the staging tree owned by its system user,
    /// but a failed chown must not abort provisioning.
    async fn apply_ownership(&self, path: &std::path::Path) {
        let Some(owner) = &self.settings.owner else {
            return;
        };
        match tokio::process::Command::new("chown")
            .arg("-R")
            .arg(owner)
            .arg("--")
            .arg(path)
            .output()
            .await
        {
            Ok(out) if out.status.success() => {}
            Ok(out) => warn!(
                path = %path.display(),
                owner,
                stderr = %String::from_utf8_lossy(&out.stderr).trim(),
                "chown failed, continuing"
            ),
            Err(e) => warn!(path = %path.display(), owner, %e, "chown unavailable, continuing"),
        }
    }
}
