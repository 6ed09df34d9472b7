//! The shared export password.
//!
//! One secret, keyed by a fixed service/account pair, protects every container
//! and archive. It is generated on first use and reused until something
//! outside this crate clears it.

use rand::Rng;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::{KeyShareError, Result};

/// Service half of the secret's key.
pub const SERVICE: &str = "PurebredKeySharing";
/// Account half of the secret's key.
pub const ACCOUNT: &str = "PurebredKeySharing";
/// Length of generated passwords.
pub const PASSWORD_LENGTH: usize = 32;
/// Characters generated passwords are drawn from (91 of them).
pub const ALPHABET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*()_+-=[]{};':,./<>?`~";

/// Secure storage for generic passwords.
///
/// Each call is treated as an atomic operation against the backing store.
pub trait SecretStore: Send + Sync {
    fn get_secret(&self, service: &str, account: &str) -> Result<Option<String>>;
    fn set_secret(&self, service: &str, account: &str, secret: &str) -> Result<()>;
    /// Returns whether a secret was removed.
    fn delete_secret(&self, service: &str, account: &str) -> Result<bool>;
}

/// Process-local [`SecretStore`].
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    secrets: Mutex<HashMap<(String, String), String>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SecretStore for MemorySecretStore {
    fn get_secret(&self, service: &str, account: &str) -> Result<Option<String>> {
        let secrets = self
            .secrets
            .lock()
            .map_err(|e| KeyShareError::SecretUnavailable(e.to_string()))?;
        Ok(secrets
            .get(&(service.to_string(), account.to_string()))
            .cloned())
    }

    fn set_secret(&self, service: &str, account: &str, secret: &str) -> Result<()> {
        let mut secrets = self
            .secrets
            .lock()
            .map_err(|e| KeyShareError::SecretUnavailable(e.to_string()))?;
        secrets.insert(
            (service.to_string(), account.to_string()),
            secret.to_string(),
        );
        Ok(())
    }

    fn delete_secret(&self, service: &str, account: &str) -> Result<bool> {
        let mut secrets = self
            .secrets
            .lock()
            .map_err(|e| KeyShareError::SecretUnavailable(e.to_string()))?;
        Ok(secrets
            .remove(&(service.to_string(), account.to_string()))
            .is_some())
    }
}

/// Generates a password of [`PASSWORD_LENGTH`] characters from [`ALPHABET`].
pub fn generate_password() -> String {
    let mut rng = rand::rng();
    (0..PASSWORD_LENGTH)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Hands out the shared export password.
#[derive(Clone)]
pub struct SecretManager {
    store: Arc<dyn SecretStore>,
}

impl SecretManager {
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        Self { store }
    }

    /// Returns the stored password, generating and storing one if absent.
    ///
    /// A password that cannot be stored is still returned; the next call will
    /// then produce a different one.
    pub fn get_or_create_password(&self) -> String {
        match self.store.get_secret(SERVICE, ACCOUNT) {
            Ok(Some(password)) => return password,
            Ok(None) => log::info!("No export password stored for {}, generating one", SERVICE),
            Err(e) => log::error!(
                "Failed to read export password for {}: {}. Generating new value and continuing",
                SERVICE,
                e
            ),
        }

        let password = generate_password();
        if let Err(e) = self.store.set_secret(SERVICE, ACCOUNT, &password) {
            let err = KeyShareError::SecretUnavailable(e.to_string());
            log::error!("{}. Returning new value and continuing", err);
        }
        password
    }

    /// Removes the stored password so the next request generates a new one.
    pub fn clear(&self) -> Result<bool> {
        let removed = self.store.delete_secret(SERVICE, ACCOUNT)?;
        if removed {
            log::info!("Cleared export password for {}", SERVICE);
        }
        Ok(removed)
    }
}

/// Request/response endpoint another process uses to learn the export password.
#[derive(Clone)]
pub struct PasswordService {
    secrets: SecretManager,
}

impl PasswordService {
    /// Name under which the service is advertised.
    pub const NAME: &'static str = "red.hound.KeySharingPassword-v1.0.0";

    pub fn new(secrets: SecretManager) -> Self {
        Self { secrets }
    }

    pub fn fetch_password(&self) -> String {
        log::debug!("Password requested via {}", Self::NAME);
        self.secrets.get_or_create_password()
    }
}
