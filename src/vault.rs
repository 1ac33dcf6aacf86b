//! Secret vault: authenticated encryption of clue secrets and word mappings
//! with the per-room key, so plaintext secrets never sit in storage.

use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    AeadCore, Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand::RngCore;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::GameError;

/// Result type for vault operations
pub type VaultResult<T> = Result<T, VaultError>;

#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("invalid room key: {0}")]
    InvalidKey(String),

    #[error("malformed envelope: {0}")]
    Malformed(String),

    /// Wrong key or tampered ciphertext; AES-GCM authentication failed
    #[error("decryption failed")]
    Decryption,

    #[error("serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}

impl From<VaultError> for GameError {
    fn from(err: VaultError) -> Self {
        GameError::Decryption(err.to_string())
    }
}

/// Sealed value at rest: both fields base64
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SealedEnvelope {
    pub iv: String,
    pub ciphertext: String,
}

/// Generate a fresh high-entropy room key (32 random bytes, base64).
/// Minted once at room creation; never returned by any room-state read API.
pub fn generate_room_key() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    BASE64.encode(bytes)
}

fn cipher_for(key_b64: &str) -> VaultResult<Aes256Gcm> {
    let key_bytes = BASE64
        .decode(key_b64)
        .map_err(|e| VaultError::InvalidKey(e.to_string()))?;
    if key_bytes.len() != 32 {
        return Err(VaultError::InvalidKey(format!(
            "expected 32 bytes, got {}",
            key_bytes.len()
        )));
    }
    let key = Key::<Aes256Gcm>::from_slice(&key_bytes);
    Ok(Aes256Gcm::new(key))
}

/// Seal any JSON-serializable value under the room key
pub fn seal<T: Serialize>(value: &T, key_b64: &str) -> VaultResult<SealedEnvelope> {
    let cipher = cipher_for(key_b64)?;
    let plaintext = serde_json::to_vec(value)?;
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext.as_slice())
        .map_err(|_| VaultError::Decryption)?;
    Ok(SealedEnvelope {
        iv: BASE64.encode(nonce),
        ciphertext: BASE64.encode(ciphertext),
    })
}

/// Open a sealed envelope. Fails on a wrong key or a malformed/tampered
/// envelope; callers treat this as a recoverable, reportable error.
pub fn open<T: DeserializeOwned>(envelope: &SealedEnvelope, key_b64: &str) -> VaultResult<T> {
    let cipher = cipher_for(key_b64)?;
    let nonce_bytes = BASE64
        .decode(&envelope.iv)
        .map_err(|e| VaultError::Malformed(format!("bad iv: {e}")))?;
    if nonce_bytes.len() != 12 {
        return Err(VaultError::Malformed(format!(
            "expected 12-byte iv, got {}",
            nonce_bytes.len()
        )));
    }
    let ciphertext = BASE64
        .decode(&envelope.ciphertext)
        .map_err(|e| VaultError::Malformed(format!("bad ciphertext: {e}")))?;
    let plaintext = cipher
        .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_slice())
        .map_err(|_| VaultError::Decryption)?;
    Ok(serde_json::from_slice(&plaintext)?)
}
