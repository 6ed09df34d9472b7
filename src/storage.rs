//! On-disk vault envelope.

use anyhow::{Context, Result, anyhow};
use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedStore {
    pub version: u8,
    pub argon2_salt: String,      // Base64 encoded
    pub encryption_nonce: String, // Base64 encoded
    pub encrypted_data: String,   // Base64 encoded
}

/// Returns true when no vault has been written at `path` yet.
pub fn is_missing(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true)
}

pub fn load_encrypted_store(path: &Path) -> Result<EncryptedStore> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read vault {}", path.display()))?;
    if content.trim().is_empty() {
        return Err(anyhow!("Vault file {} is empty", path.display()));
    }
    Ok(serde_json::from_str(&content)?)
}

pub fn save_encrypted_store(path: &Path, store: &EncryptedStore) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(store)?;
    fs::write(path, json).with_context(|| format!("Failed to write vault {}", path.display()))?;
    Ok(())
}

pub fn encode(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(bytes)
}

pub fn decode(encoded: &str) -> Result<Vec<u8>> {
    Ok(general_purpose::STANDARD.decode(encoded)?)
}
