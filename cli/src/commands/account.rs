// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Operator tooling against the account directory itself: create a user
//! row, rotate a password, or inspect what the directory and the staging
//! filesystem actually hold for a name.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::Path;

use tempoftp_core::domain::provision::AccountDirectory;
use tempoftp_core::infrastructure::accounts::MySqlAccountDirectory;
use tempoftp_core::infrastructure::config::ServiceConfig;

#[derive(Subcommand)]
pub enum AccountCommand {
    /// Insert an account directly into the directory
    Create {
        name: String,
        /// Plaintext secret; stored hashed per TEMPOFTP_HASH_SCHEME
        secret: String,
        homedir: String,
    },

    /// Rotate the stored secret of an existing account
    SetPassword { name: String, secret: String },

    /// Show the stored record and check its home directory
    Inspect { name: String },
}

impl AccountCommand {
    pub async fn run(self) -> Result<()> {
        let config = ServiceConfig::from_env().context("invalid configuration")?;
        let url = config
            .accounts_url
            .as_deref()
            .context("TEMPOFTP_ACCOUNTS_URL must be set for account commands")?;
        let directory = MySqlAccountDirectory::connect(
            url,
            config.hash_scheme,
            config.account_uid,
            config.account_gid,
        )
        .await
        .context("could not reach the account directory")?;

        match self {
            Self::Create {
                name,
                secret,
                homedir,
            } => {
                if directory.fetch(&name).await?.is_some() {
                    println!("{} account '{name}' already exists", "unchanged".yellow());
                    return Ok(());
                }
                directory
                    .ensure_account(&name, &secret, Path::new(&homedir))
                    .await?;
                println!("{} account '{name}' created", "ok".green());
                Ok(())
            }
            Self::SetPassword { name, secret } => {
                directory.set_secret(&name, &secret).await?;
                println!("{} password updated for '{name}'", "ok".green());
                Ok(())
            }
            Self::Inspect { name } => {
                let Some(record) = directory.fetch(&name).await? else {
                    println!("{} account '{name}' not found", "missing".red());
                    return Ok(());
                };
                println!("account:  {}", record.name);
                println!("uid/gid:  {}/{}", record.uid, record.gid);
                println!("homedir:  {}", record.homedir);
                println!(
                    "enabled:  {}",
                    if record.enabled {
                        "yes".green()
                    } else {
                        "no".red()
                    }
                );
                if Path::new(&record.homedir).is_dir() {
                    println!("homedir exists on this host: {}", "yes".green());
                } else {
                    println!(
                        "homedir exists on this host: {} (expected on the staging host)",
                        "no".yellow()
                    );
                }
                Ok(())
            }
        }
    }
}
