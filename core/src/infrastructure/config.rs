// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Environment-driven service configuration.
//!
//! Everything operational is a `TEMPOFTP_*` variable so the daemon, tests,
//! and the client tooling agree on one surface. The encryption key is the
//! only value both sides must share.

use std::env;
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

use crate::domain::credentials::generate_secret;
use crate::infrastructure::accounts::HashScheme;
use crate::infrastructure::simulation::{ForcedOutcome, SimulationSettings};

pub const ENV_STAGING_ROOT: &str = "TEMPOFTP_STAGING_ROOT";
pub const ENV_STORE_PATH: &str = "TEMPOFTP_STORE_PATH";
pub const ENV_ENCRYPTION_KEY: &str = "TEMPOFTP_ENCRYPTION_KEY";
pub const ENV_MIN_FREE_BYTES: &str = "TEMPOFTP_MIN_FREE_BYTES";
pub const ENV_OWNER: &str = "TEMPOFTP_OWNER";
pub const ENV_SSH_USER: &str = "TEMPOFTP_SSH_USER";
pub const ENV_HASH_SCHEME: &str = "TEMPOFTP_HASH_SCHEME";
pub const ENV_ACCOUNTS_URL: &str = "TEMPOFTP_ACCOUNTS_URL";
pub const ENV_ACCOUNT_UID: &str = "TEMPOFTP_ACCOUNT_UID";
pub const ENV_ACCOUNT_GID: &str = "TEMPOFTP_ACCOUNT_GID";
pub const ENV_SIMULATION: &str = "TEMPOFTP_SIMULATION";
pub const ENV_SIM_FORCE: &str = "TEMPOFTP_SIM_FORCE";
pub const ENV_SIM_SOURCE_BYTES: &str = "TEMPOFTP_SIM_SOURCE_BYTES";
pub const ENV_SIM_FREE_BYTES: &str = "TEMPOFTP_SIM_FREE_BYTES";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub staging_root: PathBuf,
    /// SQLite file path for the request store; `:memory:` is ephemeral.
    pub store_path: String,
    pub encryption_key: String,
    pub min_free_bytes: u64,
    /// `user:group` for advisory chown of staging directories.
    pub owner: Option<String>,
    /// Principal for remote size probes when the source names no user.
    pub ssh_user: Option<String>,
    pub hash_scheme: HashScheme,
    pub accounts_url: Option<String>,
    pub account_uid: u32,
    pub account_gid: u32,
    pub simulation: bool,
    pub sim: SimulationSettings,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let simulation = flag(ENV_SIMULATION);
        let store_path = env::var(ENV_STORE_PATH).unwrap_or_else(|_| {
            if simulation {
                "tempoftp-sim.db".to_string()
            } else {
                "tempoftp.db".to_string()
            }
        });
        let encryption_key = match env::var(ENV_ENCRYPTION_KEY) {
            Ok(key) if !key.is_empty() => key,
            _ => {
                warn!(
                    "{ENV_ENCRYPTION_KEY} is not set; using a generated key, \
                     issued secrets will not be decryptable by clients"
                );
                generate_secret(32)
            }
        };
        let sim = SimulationSettings {
            force: match env::var(ENV_SIM_FORCE).ok().as_deref() {
                Some("ok") => Some(ForcedOutcome::Succeed),
                Some("fail") => Some(ForcedOutcome::Fail),
                Some(other) => {
                    return Err(ConfigError::Invalid {
                        var: ENV_SIM_FORCE,
                        reason: format!("expected 'ok' or 'fail', got '{other}'"),
                    })
                }
                None => None,
            },
            source_bytes: parsed(ENV_SIM_SOURCE_BYTES)?,
            free_bytes: parsed(ENV_SIM_FREE_BYTES)?,
        };
        Ok(Self {
            staging_root: env::var(ENV_STAGING_ROOT)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/data")),
            store_path,
            encryption_key,
            min_free_bytes: parsed(ENV_MIN_FREE_BYTES)?.unwrap_or(0),
            owner: env::var(ENV_OWNER).ok().filter(|s| !s.is_empty()),
            ssh_user: env::var(ENV_SSH_USER).ok().filter(|s| !s.is_empty()),
            hash_scheme: match env::var(ENV_HASH_SCHEME) {
                Ok(name) => HashScheme::parse(&name).map_err(|e| ConfigError::Invalid {
                    var: ENV_HASH_SCHEME,
                    reason: e.to_string(),
                })?,
                Err(_) => HashScheme::Sha512,
            },
            accounts_url: env::var(ENV_ACCOUNTS_URL).ok().filter(|s| !s.is_empty()),
            account_uid: parsed(ENV_ACCOUNT_UID)?.unwrap_or(2001),
            account_gid: parsed(ENV_ACCOUNT_GID)?.unwrap_or(2001),
            simulation,
            sim,
        })
    }
}

fn flag(var: &str) -> bool {
    matches!(
        env::var(var).ok().as_deref(),
        Some("1") | Some("true") | Some("yes")
    )
}

fn parsed<T: std::str::FromStr>(var: &'static str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::Invalid {
                var,
                reason: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test so the process-global environment is touched in one place.
    #[test]
    fn reads_the_full_surface_from_env() {
        env::set_var(ENV_STAGING_ROOT, "/srv/staging");
        env::set_var(ENV_STORE_PATH, ":memory:");
        env::set_var(ENV_ENCRYPTION_KEY, "unit-test-key");
        env::set_var(ENV_MIN_FREE_BYTES, "4096");
        env::set_var(ENV_HASH_SCHEME, "cleartext");
        env::set_var(ENV_SIMULATION, "1");
        env::set_var(ENV_SIM_FORCE, "fail");
        env::set_var(ENV_SIM_SOURCE_BYTES, "123");

        let config = ServiceConfig::from_env().unwrap();
        assert_eq!(config.staging_root, PathBuf::from("/srv/staging"));
        assert_eq!(config.store_path, ":memory:");
        assert_eq!(config.encryption_key, "unit-test-key");
        assert_eq!(config.min_free_bytes, 4096);
        assert_eq!(config.hash_scheme, HashScheme::Cleartext);
        assert!(config.simulation);
        assert_eq!(config.sim.force, Some(ForcedOutcome::Fail));
        assert_eq!(config.sim.source_bytes, Some(123));

        env::set_var(ENV_SIM_FORCE, "sometimes");
        assert!(ServiceConfig::from_env().is_err());

        for var in [
            ENV_STAGING_ROOT,
            ENV_STORE_PATH,
            ENV_ENCRYPTION_KEY,
            ENV_MIN_FREE_BYTES,
            ENV_HASH_SCHEME,
            ENV_SIMULATION,
            ENV_SIM_FORCE,
            ENV_SIM_SOURCE_BYTES,
        ] {
            env::remove_var(var);
        }
    }
}
