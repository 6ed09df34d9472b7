//! Encrypted vault backing both the credential store and the secret store.
//!
//! The vault is a JSON envelope (see [`crate::storage`]) whose decrypted
//! payload lists identity records and generic passwords. Every mutation
//! re-seals the whole payload with a fresh salt and nonce, and is committed in
//! memory only after the write succeeds.

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::attributes::Attributes;
use crate::credential::{Category, Credential};
use crate::error::KeyShareError;
use crate::secret::SecretStore;
use crate::store::CredentialStore;
use crate::{crypto, storage};

/// An identity as persisted in the vault. Binary fields are base64.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub category: Category,
    #[serde(default)]
    pub not_before: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    pub certificate: String,
    pub private_key: String,
    #[serde(default)]
    pub attributes: Attributes,
}

impl IdentityRecord {
    pub fn new(
        label: Option<String>,
        category: Category,
        not_before: i64,
        serial: Option<String>,
        certificate: &[u8],
        private_key: &[u8],
    ) -> Self {
        Self {
            label,
            category,
            not_before,
            serial,
            certificate: storage::encode(certificate),
            private_key: storage::encode(private_key),
            attributes: Attributes::new(),
        }
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Decodes into the snapshot handed to the rest of the crate.
    pub fn to_credential(&self) -> Result<Credential> {
        let certificate = storage::decode(&self.certificate)
            .map_err(|e| anyhow!("Invalid certificate encoding: {}", e))?;
        let private_key = storage::decode(&self.private_key)
            .map_err(|e| anyhow!("Invalid private key encoding: {}", e))?;
        Ok(Credential::new(
            self.label.as_deref(),
            self.category,
            self.not_before,
            self.serial.clone(),
            certificate,
            private_key,
        )
        .with_attributes(self.attributes.clone()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SecretRecord {
    service: String,
    account: String,
    secret: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct VaultPayload {
    #[serde(default)]
    identities: Vec<IdentityRecord>,
    #[serde(default)]
    secrets: Vec<SecretRecord>,
}

/// A master-password protected vault file.
pub struct Keychain {
    path: PathBuf,
    master: String,
    payload: RwLock<VaultPayload>,
}

impl Keychain {
    /// Creates a new, empty vault at `path`, replacing anything there.
    pub fn create(path: impl Into<PathBuf>, master: &str) -> Result<Self> {
        let keychain = Self {
            path: path.into(),
            master: master.to_string(),
            payload: RwLock::new(VaultPayload::default()),
        };
        keychain.write(&VaultPayload::default())?;
        log::info!("Created vault at {}", keychain.path.display());
        Ok(keychain)
    }

    /// Opens an existing vault. Fails on a wrong master password.
    pub fn open(path: impl Into<PathBuf>, master: &str) -> Result<Self> {
        let path = path.into();
        let envelope = storage::load_encrypted_store(&path)?;
        let plaintext = crypto::open(&envelope, master)?;
        let payload: VaultPayload = serde_json::from_slice(&plaintext)?;
        log::info!(
            "Opened vault at {} ({} identities)",
            path.display(),
            payload.identities.len()
        );
        Ok(Self {
            path,
            master: master.to_string(),
            payload: RwLock::new(payload),
        })
    }

    /// Opens the vault at `path`, creating it if nothing has been written yet.
    pub fn open_or_create(path: impl Into<PathBuf>, master: &str) -> Result<Self> {
        let path = path.into();
        if storage::is_missing(&path) {
            Self::create(path, master)
        } else {
            Self::open(path, master)
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn identity_count(&self) -> usize {
        self.payload.read().map(|p| p.identities.len()).unwrap_or(0)
    }

    /// Stores a new identity and returns its credential id.
    pub fn add_identity(&self, record: IdentityRecord) -> Result<String> {
        let id = record.to_credential()?.id;
        self.update(|payload| {
            if payload
                .identities
                .iter()
                .any(|r| credential_id(r).as_deref() == Some(id.as_str()))
            {
                return Err(anyhow!("'{}' already exists.", id));
            }
            payload.identities.push(record);
            Ok(())
        })?;
        log::info!("Added identity '{}'", id);
        Ok(id)
    }

    /// Removes the identity with credential id `id`. Returns whether one was removed.
    pub fn remove_identity(&self, id: &str) -> Result<bool> {
        let removed = self.update(|payload| {
            let before = payload.identities.len();
            payload
                .identities
                .retain(|r| credential_id(r).as_deref() != Some(id));
            Ok(payload.identities.len() != before)
        })?;
        if removed {
            log::info!("Removed identity '{}'", id);
        }
        Ok(removed)
    }

    /// Applies `f` to a copy of the payload, persists it, then commits it.
    fn update<T>(&self, f: impl FnOnce(&mut VaultPayload) -> Result<T>) -> Result<T> {
        let mut payload = self
            .payload
            .write()
            .map_err(|e| anyhow!("Vault lock poisoned: {}", e))?;
        let mut draft = payload.clone();
        let out = f(&mut draft)?;
        self.write(&draft)?;
        *payload = draft;
        Ok(out)
    }

    fn write(&self, payload: &VaultPayload) -> Result<()> {
        let plaintext = serde_json::to_vec(payload)?;
        let envelope = crypto::seal(&plaintext, &self.master)?;
        storage::save_encrypted_store(&self.path, &envelope)
    }
}

fn credential_id(record: &IdentityRecord) -> Option<String> {
    storage::decode(&record.certificate)
        .ok()
        .map(|cert| Credential::derive_id(record.label.as_deref(), &cert))
}

impl CredentialStore for Keychain {
    fn query_all(&self) -> crate::error::Result<Vec<Credential>> {
        let payload = self
            .payload
            .read()
            .map_err(|e| KeyShareError::StoreUnavailable(e.to_string()))?;
        payload
            .identities
            .iter()
            .map(|record| {
                record.to_credential().map_err(|e| {
                    log::error!(
                        "Vault record {:?} ({}, serial {:?}) is unreadable: {}",
                        record.label,
                        record.category,
                        record.serial,
                        e
                    );
                    KeyShareError::StoreUnavailable(e.to_string())
                })
            })
            .collect()
    }
}

impl SecretStore for Keychain {
    fn get_secret(&self, service: &str, account: &str) -> crate::error::Result<Option<String>> {
        let payload = self
            .payload
            .read()
            .map_err(|e| KeyShareError::SecretUnavailable(e.to_string()))?;
        Ok(payload
            .secrets
            .iter()
            .find(|s| s.service == service && s.account == account)
            .map(|s| s.secret.clone()))
    }

    fn set_secret(&self, service: &str, account: &str, secret: &str) -> crate::error::Result<()> {
        self.update(|payload| {
            match payload
                .secrets
                .iter_mut()
                .find(|s| s.service == service && s.account == account)
            {
                Some(existing) => existing.secret = secret.to_string(),
                None => payload.secrets.push(SecretRecord {
                    service: service.to_string(),
                    account: account.to_string(),
                    secret: secret.to_string(),
                }),
            }
            Ok(())
        })
        .map_err(|e| KeyShareError::SecretUnavailable(e.to_string()))
    }

    fn delete_secret(&self, service: &str, account: &str) -> crate::error::Result<bool> {
        self.update(|payload| {
            let before = payload.secrets.len();
            payload
                .secrets
                .retain(|s| !(s.service == service && s.account == account));
            Ok(payload.secrets.len() != before)
        })
        .map_err(|e| KeyShareError::SecretUnavailable(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(label: &str, category: Category) -> IdentityRecord {
        IdentityRecord::new(
            Some(label.to_string()),
            category,
            100,
            Some("0A".to_string()),
            &[0x30, 0x01, 0x01],
            &[0x30, 0x01, 0x02],
        )
    }

    #[test]
    fn test_create_and_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vault.json");

        let keychain = Keychain::create(&path, "master").unwrap();
        assert_eq!(keychain.add_identity(record("auth", Category::Authentication)).unwrap(), "auth");
        keychain.set_secret("svc", "acct", "pw").unwrap();
        drop(keychain);

        let reopened = Keychain::open(&path, "master").unwrap();
        let credentials = reopened.query_all().unwrap();
        assert_eq!(credentials.len(), 1);
        assert_eq!(credentials[0].id, "auth");
        assert_eq!(credentials[0].certificate, vec![0x30, 0x01, 0x01]);
        assert_eq!(reopened.get_secret("svc", "acct").unwrap().as_deref(), Some("pw"));
    }

    #[test]
    fn test_wrong_master_password() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vault.json");
        Keychain::create(&path, "master").unwrap();
        assert!(Keychain::open(&path, "wrong").is_err());
    }

    #[test]
    fn test_open_or_create() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vault.json");
        let keychain = Keychain::open_or_create(&path, "master").unwrap();
        keychain.add_identity(record("sig", Category::Signature)).unwrap();

        let keychain = Keychain::open_or_create(&path, "master").unwrap();
        assert_eq!(keychain.identity_count(), 1);
    }

    #[test]
    fn test_duplicate_and_remove() {
        let dir = tempdir().unwrap();
        let keychain = Keychain::create(dir.path().join("vault.json"), "master").unwrap();
        keychain.add_identity(record("dev", Category::Device)).unwrap();
        assert!(keychain.add_identity(record("dev", Category::Device)).is_err());
        assert_eq!(keychain.identity_count(), 1);

        assert!(keychain.remove_identity("dev").unwrap());
        assert!(!keychain.remove_identity("dev").unwrap());
        assert!(keychain.query_all().unwrap().is_empty());
    }

    #[test]
    fn test_unlabelled_identity_uses_certificate_hash() {
        let dir = tempdir().unwrap();
        let keychain = Keychain::create(dir.path().join("vault.json"), "master").unwrap();
        let mut unlabelled = record("x", Category::Encryption);
        unlabelled.label = None;
        let id = keychain.add_identity(unlabelled).unwrap();
        assert_eq!(id.len(), 64);
        assert!(keychain.remove_identity(&id).unwrap());
    }

    #[test]
    fn test_query_fails_closed_on_bad_record() {
        let dir = tempdir().unwrap();
        let keychain = Keychain::create(dir.path().join("vault.json"), "master").unwrap();
        keychain.add_identity(record("good", Category::Device)).unwrap();
        keychain
            .update(|payload| {
                payload.identities[0].certificate = "***".to_string();
                Ok(())
            })
            .unwrap();

        let err = keychain.query_all().unwrap_err();
        assert!(matches!(err, KeyShareError::StoreUnavailable(_)));
    }

    #[test]
    fn test_secret_overwrite_and_delete() {
        let dir = tempdir().unwrap();
        let keychain = Keychain::create(dir.path().join("vault.json"), "master").unwrap();
        keychain.set_secret("svc", "acct", "one").unwrap();
        keychain.set_secret("svc", "acct", "two").unwrap();
        assert_eq!(keychain.get_secret("svc", "acct").unwrap().as_deref(), Some("two"));
        assert!(keychain.delete_secret("svc", "acct").unwrap());
        assert_eq!(keychain.get_secret("svc", "acct").unwrap(), None);
    }
}
