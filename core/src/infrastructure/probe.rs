// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Source sizing and staging-space adapters.
//!
//! Sizing runs `du -sb` — locally when the source host resolves to this
//! machine, otherwise over ssh with the configured principal. The space
//! checker asks the filesystem under the staging root.

use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

use crate::domain::provision::{ProvisionError, SizeProbe, SpaceChecker};
use crate::domain::source::SourceLocation;

pub fn local_hostname() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "localhost".to_string())
}

pub struct SshSizeProbe {
    ssh_user: Option<String>,
    local_host: String,
}

impl SshSizeProbe {
    pub fn new(ssh_user: Option<String>) -> Self {
        Self {
            ssh_user,
            local_host: local_hostname(),
        }
    }
}

#[async_trait]
impl SizeProbe for SshSizeProbe {
    async fn source_size_bytes(&self, source: &SourceLocation) -> Result<u64, ProvisionError> {
        let output = if source.is_local(&self.local_host) {
            debug!(%source, "sizing local source with du");
            Command::new("du")
                .args(["-sb", "--"])
                .arg(&source.path)
                .output()
                .await
        } else {
            let principal = source.principal(self.ssh_user.as_deref());
            debug!(%source, principal, "sizing remote source over ssh");
            Command::new("ssh")
                .arg(&principal)
                .args(["du", "-sb", "--"])
                .arg(&source.path)
                .output()
                .await
        }
        .map_err(|e| ProvisionError::SizeProbeFailed(format!("could not run du: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProvisionError::SizeProbeFailed(
                stderr.trim().to_string(),
            ));
        }
        parse_du_output(&String::from_utf8_lossy(&output.stdout))
    }
}

fn parse_du_output(stdout: &str) -> Result<u64, ProvisionError> {
    stdout
        .split_whitespace()
        .next()
        .and_then(|bytes| bytes.parse::<u64>().ok())
        .ok_or_else(|| {
            ProvisionError::SizeProbeFailed(format!(
                "malformed du output: '{}'",
                stdout.trim()
            ))
        })
}

/// Free bytes on the filesystem backing a path.
pub struct MountSpaceChecker;

#[async_trait]
impl SpaceChecker for MountSpaceChecker {
    async fn available_bytes(&self, mount: &Path) -> Result<u64, ProvisionError> {
        fs2::available_space(mount).map_err(|e| {
            ProvisionError::Internal(format!(
                "failed to read free space at {}: {e}",
                mount.display()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_du_size_line() {
        assert_eq!(parse_du_output("4096\t/data/src\n").unwrap(), 4096);
    }

    #[test]
    fn rejects_empty_or_malformed_du_output() {
        assert!(parse_du_output("").is_err());
        assert!(parse_du_output("not-a-number /data\n").is_err());
    }

    #[tokio::test]
    async fn space_checker_reads_a_real_mount() {
        let dir = tempfile::tempdir().unwrap();
        let free = MountSpaceChecker.available_bytes(dir.path()).await.unwrap();
        assert!(free > 0);
    }
}
