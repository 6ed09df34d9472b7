//! Vault sealing: Argon2id key derivation and ChaCha20-Poly1305.

use anyhow::{Result, anyhow};
use argon2::Argon2;
use chacha20poly1305::aead::Aead;
use chacha20poly1305::{ChaCha20Poly1305, KeyInit, Nonce};
use rand::{TryRngCore, rngs::OsRng};

use crate::storage::{self, EncryptedStore};

/// Envelope format version written by [`seal`].
pub const ENVELOPE_VERSION: u8 = 1;

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;

pub fn derive_key(master: &str, salt: &[u8]) -> Result<[u8; 32]> {
    let mut key = [0u8; 32];
    Argon2::default()
        .hash_password_into(master.as_bytes(), salt, &mut key)
        .map_err(|e| anyhow!("Failed to derive vault key using Argon2id: {}", e))?;
    Ok(key)
}

fn random_bytes<const N: usize>() -> Result<[u8; N]> {
    let mut bytes = [0u8; N];
    OsRng.try_fill_bytes(&mut bytes)?;
    Ok(bytes)
}

/// Encrypts `plaintext` under `master` with a fresh salt and nonce.
pub fn seal(plaintext: &[u8], master: &str) -> Result<EncryptedStore> {
    let salt = random_bytes::<SALT_LEN>()?;
    let nonce = random_bytes::<NONCE_LEN>()?;
    let key = derive_key(master, &salt)?;

    let cipher = ChaCha20Poly1305::new(&key.into());
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| anyhow!("Vault encryption failed"))?;

    Ok(EncryptedStore {
        version: ENVELOPE_VERSION,
        argon2_salt: storage::encode(&salt),
        encryption_nonce: storage::encode(&nonce),
        encrypted_data: storage::encode(&ciphertext),
    })
}

/// Decrypts an envelope produced by [`seal`].
pub fn open(envelope: &EncryptedStore, master: &str) -> Result<Vec<u8>> {
    if envelope.version != ENVELOPE_VERSION {
        return Err(anyhow!(
            "Unsupported vault version {} (expected {})",
            envelope.version,
            ENVELOPE_VERSION
        ));
    }

    let salt = storage::decode(&envelope.argon2_salt)?;
    let nonce = storage::decode(&envelope.encryption_nonce)?;
    if nonce.len() != NONCE_LEN {
        return Err(anyhow!("Vault nonce has length {}", nonce.len()));
    }
    let ciphertext = storage::decode(&envelope.encrypted_data)?;
    let key = derive_key(master, &salt)?;

    ChaCha20Poly1305::new(&key.into())
        .decrypt(Nonce::from_slice(&nonce), ciphertext.as_ref())
        .map_err(|_| anyhow!("Decryption failed - invalid master password"))
}
