// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Data mover.
//!
//! Same-host sources are linked into the destination; anything else goes
//! through `rsync -a` so file attributes survive the copy.

use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info};

use crate::domain::provision::{DataMover, ProvisionError};
use crate::domain::source::SourceLocation;
use crate::infrastructure::probe::local_hostname;

pub struct SystemDataMover {
    ssh_user: Option<String>,
    local_host: String,
}

impl SystemDataMover {
    pub fn new(ssh_user: Option<String>) -> Self {
        Self {
            ssh_user,
            local_host: local_hostname(),
        }
    }

    async fn link_local(&self, source: &SourceLocation, dest: &Path) -> Result<(), ProvisionError> {
        let src = Path::new(&source.path);
        tokio::fs::symlink_metadata(src).await.map_err(|_| {
            ProvisionError::LocalLinkFailed(format!("source {} does not exist", src.display()))
        })?;
        let name = src.file_name().ok_or_else(|| {
            ProvisionError::LocalLinkFailed(format!(
                "source {} has no final path component",
                src.display()
            ))
        })?;
        let target = dest.join(name);
        debug!(src = %src.display(), target = %target.display(), "linking same-host source");
        tokio::fs::symlink(src, &target).await.map_err(|e| {
            ProvisionError::LocalLinkFailed(format!(
                "could not link {} -> {}: {e}",
                src.display(),
                target.display()
            ))
        })
    }

    async fn rsync_remote(
        &self,
        source: &SourceLocation,
        dest: &Path,
    ) -> Result<(), ProvisionError> {
        let spec = source.remote_spec(self.ssh_user.as_deref());
        info!(%spec, dest = %dest.display(), "copying remote source with rsync");
        let result = Command::new("rsync")
            .arg("-a")
            .arg("--")
            .arg(&spec)
            .arg(dest)
            .output()
            .await;
        match result {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(
                ProvisionError::ToolNotAvailable("rsync is not installed".to_string()),
            ),
            Err(e) => Err(ProvisionError::TransferFailed(e.to_string())),
            Ok(out) if !out.status.success() => Err(ProvisionError::TransferFailed(
                String::from_utf8_lossy(&out.stderr).trim().to_string(),
            )),
            Ok(_) => Ok(()),
        }
    }
}

#[async_trait]
impl DataMover for SystemDataMover {
    async fn transfer(&self, source: &SourceLocation, dest: &Path) -> Result<(), ProvisionError> {
        if source.is_local(&self.local_host) {
            self.link_local(source, dest).await
        } else {
            self.rsync_remote(source, dest).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn links_an_existing_local_source() {
        let staging = tempfile::tempdir().unwrap();
        let src_dir = tempfile::tempdir().unwrap();
        let src = src_dir.path().join("dataset");
        tokio::fs::create_dir(&src).await.unwrap();

        let mover = SystemDataMover::new(None);
        let source =
            SourceLocation::parse(&format!("localhost:{}", src.display())).unwrap();
        mover.transfer(&source, staging.path()).await.unwrap();
        let linked = staging.path().join("dataset");
        assert!(tokio::fs::symlink_metadata(&linked).await.is_ok());
    }

    #[tokio::test]
    async fn missing_local_source_is_a_link_failure() {
        let staging = tempfile::tempdir().unwrap();
        let mover = SystemDataMover::new(None);
        let source = SourceLocation::parse("localhost:/no/such/path/anywhere").unwrap();
        let err = mover.transfer(&source, staging.path()).await.unwrap_err();
        assert!(matches!(err, ProvisionError::LocalLinkFailed(_)));
    }
}
