// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Client commands: submit a provisioning request and poll its status over
//! the daemon's HTTP API. The secret comes back encrypted; decryption
//! happens here, with the shared key, never on the wire.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use serde_json::{json, Value};

use tempoftp_core::infrastructure::config::ENV_ENCRYPTION_KEY;
use tempoftp_core::infrastructure::crypto::SecretCipher;

#[derive(Subcommand)]
pub enum TransferCommand {
    /// Submit a provisioning request
    Create {
        /// Caller-chosen unique request id
        id: String,
        /// Owner contact the account name is derived from
        owner_contact: String,
        /// Source location, host:/absolute/path or user@host:/absolute/path
        source_path: String,
        /// Days the account stays usable
        #[arg(default_value = "7")]
        validity_days: u32,
    },

    /// Poll the status of a request
    Status {
        id: String,
        /// Decrypt the issued secret with TEMPOFTP_ENCRYPTION_KEY
        #[arg(long)]
        decrypt: bool,
    },
}

impl TransferCommand {
    pub async fn run(self, api_url: &str) -> Result<()> {
        let client = reqwest::Client::new();
        match self {
            Self::Create {
                id,
                owner_contact,
                source_path,
                validity_days,
            } => {
                let response = client
                    .post(format!("{api_url}/transfers"))
                    .json(&json!({
                        "id": id,
                        "owner_contact": owner_contact,
                        "source_path": source_path,
                        "validity_days": validity_days,
                    }))
                    .send()
                    .await
                    .with_context(|| format!("could not reach {api_url}"))?;
                let status = response.status();
                let body: Value = response.json().await.context("malformed response")?;
                if status.is_success() {
                    println!(
                        "{} request '{}' admitted (state: {})",
                        "ok".green(),
                        body["id"].as_str().unwrap_or(""),
                        body["state"].as_str().unwrap_or("")
                    );
                } else {
                    println!(
                        "{} {}",
                        "rejected".red(),
                        body["error"].as_str().unwrap_or("unknown error")
                    );
                }
                Ok(())
            }
            Self::Status { id, decrypt } => {
                let response = client
                    .get(format!("{api_url}/transfers/{id}"))
                    .send()
                    .await
                    .with_context(|| format!("could not reach {api_url}"))?;
                if response.status() == reqwest::StatusCode::NOT_FOUND {
                    println!("{} no request found for id '{id}'", "not found".red());
                    return Ok(());
                }
                let body: Value = response.json().await.context("malformed response")?;
                let state = body["state"].as_str().unwrap_or("unknown");
                let painted = match state {
                    "ready" => state.green(),
                    "error" => state.red(),
                    _ => state.yellow(),
                };
                println!("{id}: {painted} - {}", body["message"].as_str().unwrap_or(""));
                if state == "ready" {
                    if let Some(account) = body["account"].as_str() {
                        println!("  account:  {account}");
                    }
                    if let Some(days) = body["validity_days"].as_u64() {
                        println!("  validity: {days} days");
                    }
                    if let Some(token) = body["secret"].as_str() {
                        if decrypt {
                            print_decrypted(token);
                        } else {
                            println!("  secret:   {token} (encrypted; pass --decrypt)");
                        }
                    }
                }
                Ok(())
            }
        }
    }
}

fn print_decrypted(token: &str) {
    match std::env::var(ENV_ENCRYPTION_KEY) {
        Ok(key) if !key.is_empty() => match SecretCipher::new(&key).decrypt(token) {
            Ok(secret) => println!("  secret:   {secret}"),
            Err(e) => println!("  secret:   {} ({e})", "<undecryptable>".red()),
        },
        _ => println!(
            "  secret:   {} ({ENV_ENCRYPTION_KEY} is not set)",
            "<undecryptable>".red()
        ),
    }
}
