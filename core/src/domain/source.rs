// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SourceParseError {
    #[error("source '{0}' must have the form host:/absolute/path or user@host:/absolute/path")]
    MissingSeparator(String),
    #[error("source '{0}' has an empty host")]
    EmptyHost(String),
    #[error("source '{0}' has an empty user before '@'")]
    EmptyUser(String),
    #[error("source path in '{0}' must be absolute (start with '/')")]
    RelativePath(String),
}

/// Validated source descriptor: `host:/absolute/path` or
/// `user@host:/absolute/path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub user: Option<String>,
    pub host: String,
    pub path: String,
}

impl SourceLocation {
    pub fn parse(raw: &str) -> Result<Self, SourceParseError> {
        let (endpoint, path) = raw
            .split_once(':')
            .ok_or_else(|| SourceParseError::MissingSeparator(raw.to_string()))?;
        if !path.starts_with('/') {
            return Err(SourceParseError::RelativePath(raw.to_string()));
        }
        let (user, host) = match endpoint.split_once('@') {
            Some((user, host)) => {
                if user.is_empty() {
                    return Err(SourceParseError::EmptyUser(raw.to_string()));
                }
                (Some(user.to_string()), host)
            }
            None => (None, endpoint),
        };
        if host.is_empty() {
            return Err(SourceParseError::EmptyHost(raw.to_string()));
        }
        Ok(Self {
            user,
            host: host.to_string(),
            path: path.to_string(),
        })
    }

    /// Whether the source resolves to this machine, in which case the data
    /// mover can link instead of copying over the network.
    pub fn is_local(&self, local_host: &str) -> bool {
        self.host == local_host
            || matches!(self.host.as_str(), "localhost" | "127.0.0.1" | "::1")
    }

    /// The `[user@]host:path` form consumed by ssh and rsync. A configured
    /// fallback principal is used when the source itself names no user.
    pub fn remote_spec(&self, fallback_user: Option<&str>) -> String {
        match self.user.as_deref().or(fallback_user) {
            Some(user) => format!("{user}@{}:{}", self.host, self.path),
            None => format!("{}:{}", self.host, self.path),
        }
    }

    /// The `[user@]host` principal for remote command execution.
    pub fn principal(&self, fallback_user: Option<&str>) -> String {
        match self.user.as_deref().or(fallback_user) {
            Some(user) => format!("{user}@{}", self.host),
            None => self.host.clone(),
        }
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.user {
            Some(user) => write!(f, "{user}@{}:{}", self.host, self.path),
            None => write!(f, "{}:{}", self.host, self.path),
        }
    }
}
