// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Secret-at-rest encryption.
//!
//! AES-256-GCM with a random 12-byte nonce per token; the stored form is
//! `base64(nonce || ciphertext)`. The key is derived from a process-wide key
//! string shared between the daemon and any client that wants to decrypt
//! issued secrets. A mismatched key fails loudly instead of yielding
//! garbage.

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};
use thiserror::Error;

const NONCE_LEN: usize = 12;

#[derive(Debug, Error)]
pub enum CipherError {
    #[error("encryption failed")]
    Encrypt,
    #[error("decryption failed: token does not match the configured key")]
    Decrypt,
    #[error("malformed ciphertext token")]
    Malformed,
}

pub struct SecretCipher {
    cipher: Aes256Gcm,
}

impl SecretCipher {
    /// Key material is an arbitrary operator-supplied string; the AES key is
    /// its SHA-256 digest so both sides only have to agree on the string.
    pub fn new(key_material: &str) -> Self {
        let key = Sha256::digest(key_material.as_bytes());
        let cipher =
            Aes256Gcm::new_from_slice(&key).expect("sha-256 digest is a valid aes-256 key");
        Self { cipher }
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);
        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| CipherError::Encrypt)?;
        let mut token = nonce_bytes.to_vec();
        token.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(token))
    }

    pub fn decrypt(&self, token: &str) -> Result<String, CipherError> {
        let raw = BASE64.decode(token).map_err(|_| CipherError::Malformed)?;
        if raw.len() <= NONCE_LEN {
            return Err(CipherError::Malformed);
        }
        let (nonce, ciphertext) = raw.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CipherError::Decrypt)?;
        String::from_utf8(plaintext).map_err(|_| CipherError::Decrypt)
    }
}
