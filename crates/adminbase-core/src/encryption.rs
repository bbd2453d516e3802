// Note: Deprecation warnings from generic-array 0.14.x are expected
// These will be resolved when aes-gcm upgrades to 0.11.0
#![allow(deprecated)]

use aes_gcm::{
    aead::{Aead, KeyInit},
    AeadCore, Aes256Gcm, Nonce,
};
use anyhow::{anyhow, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

const NONCE_LENGTH: usize = 12;

/// AES-256-GCM encryption for data-source credentials at rest.
///
/// Credential blobs are stored as `base64(nonce || ciphertext)`. The master
/// key is supplied by the host application (environment or key file) and is
/// never persisted alongside the blobs. Decryption happens on demand per
/// request; the plaintext must not be cached beyond the request scope.
#[derive(Debug)]
pub struct EncryptionService {
    master_key: [u8; 32],
}

impl EncryptionService {
    /// Creates a service from a raw 32-byte key or a 64-character hex key.
    pub fn new(master_key: &str) -> Result<Self> {
        let key_bytes = match master_key.len() {
            32 => master_key.as_bytes().to_vec(),
            64 => hex::decode(master_key).map_err(|e| anyhow!("Invalid hex key: {}", e))?,
            _ => {
                return Err(anyhow!(
                    "Master key must be exactly 32 bytes or 64 hex characters"
                ))
            }
        };

        let mut key = [0u8; 32];
        key.copy_from_slice(&key_bytes);
        Ok(Self { master_key: key })
    }

    /// Derives a key from a password using SHA-256.
    pub fn new_from_password(password: &str) -> Self {
        let digest = Sha256::digest(password.as_bytes());
        let mut key = [0u8; 32];
        key.copy_from_slice(&digest);
        Self { master_key: key }
    }

    /// Encrypts bytes, returning `base64(nonce || ciphertext)`.
    pub fn encrypt(&self, data: &[u8]) -> Result<String> {
        let cipher = Aes256Gcm::new(self.master_key.as_slice().into());
        let nonce = Aes256Gcm::generate_nonce(&mut aes_gcm::aead::OsRng);

        let ciphertext = cipher
            .encrypt(&nonce, data)
            .map_err(|e| anyhow!("Encryption error: {}", e))?;

        let mut combined = nonce.to_vec();
        combined.extend(ciphertext);
        Ok(BASE64.encode(combined))
    }

    /// Decrypts a blob produced by [`encrypt`](Self::encrypt).
    pub fn decrypt(&self, encoded_data: &str) -> Result<Vec<u8>> {
        let data = BASE64
            .decode(encoded_data)
            .map_err(|e| anyhow!("Base64 decode error: {}", e))?;

        if data.len() < NONCE_LENGTH {
            return Err(anyhow!("Invalid encrypted data"));
        }

        let (nonce_bytes, ciphertext) = data.split_at(NONCE_LENGTH);
        let cipher = Aes256Gcm::new(self.master_key.as_slice().into());

        cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|e| anyhow!("Decryption failed: {}", e))
    }

    pub fn encrypt_string(&self, data: &str) -> Result<String> {
        self.encrypt(data.as_bytes())
    }

    pub fn decrypt_string(&self, encoded_data: &str) -> Result<String> {
        let plaintext = self.decrypt(encoded_data)?;
        String::from_utf8(plaintext).map_err(|e| anyhow!("UTF-8 decode failed: {}", e))
    }

    /// Generates a random 32-byte master key as base64.
    pub fn generate_key() -> String {
        let mut key = [0u8; 32];
        OsRng.fill_bytes(&mut key);
        BASE64.encode(key)
    }

    /// Generates a random 32-byte master key as hex, for direct use with `new()`.
    pub fn generate_raw_key() -> String {
        let mut key = [0u8; 32];
        OsRng.fill_bytes(&mut key);
        hex::encode(key)
    }
}
