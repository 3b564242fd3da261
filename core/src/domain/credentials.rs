// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Credential generation.
//!
//! Account names are derived deterministically from the owner contact so
//! that re-provisioning for the same owner lands on the same account;
//! secrets are random and generated only when the account directory does not
//! already hold one for the derived name.

use rand::distr::Alphanumeric;
use rand::Rng;

pub const ACCOUNT_PREFIX: &str = "ftp_";
pub const DEFAULT_SECRET_LEN: usize = 12;

/// Derive the account name for an owner contact.
///
/// Rule: `ftp_<local-part>_<first-domain-label>`, both segments normalized
/// to `[a-z0-9_]` with runs of separators collapsed.
/// E.g. `danae@zaln.unam.mx` -> `ftp_danae_zaln`.
pub fn derive_account_name(owner_contact: &str) -> String {
    let (local, domain) = match owner_contact.split_once('@') {
        Some((local, domain)) => (local, domain),
        None => (owner_contact, ""),
    };
    let first_label = domain.split('.').next().unwrap_or("");
    format!(
        "{ACCOUNT_PREFIX}{}_{}",
        normalize(local),
        normalize(first_label)
    )
}

/// Random alphanumeric secret.
pub fn generate_secret(length: usize) -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

fn normalize(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for ch in segment.trim().chars() {
        let mapped = match ch.to_ascii_lowercase() {
            c @ ('a'..='z' | '0'..='9') => c,
            _ => '_',
        };
        if mapped == '_' && out.ends_with('_') {
            continue;
        }
        out.push(mapped);
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "x".to_string()
    } else {
        trimmed.to_string()
    }
}
