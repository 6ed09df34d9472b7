//! Read side of the credential store.

use std::sync::RwLock;

use crate::credential::Credential;
use crate::error::{KeyShareError, Result};

/// Source of identity snapshots.
///
/// `query_all` fails closed: on any error the caller gets an error, never a
/// partial list.
pub trait CredentialStore: Send + Sync {
    fn query_all(&self) -> Result<Vec<Credential>>;
}

/// Process-local [`CredentialStore`], mainly for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    credentials: RwLock<Vec<Credential>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(credentials: Vec<Credential>) -> Self {
        Self {
            credentials: RwLock::new(credentials),
        }
    }

    /// Appends a credential, keeping insertion order.
    pub fn insert(&self, credential: Credential) -> Result<()> {
        self.credentials
            .write()
            .map_err(|e| KeyShareError::StoreUnavailable(e.to_string()))?
            .push(credential);
        Ok(())
    }
}

impl CredentialStore for MemoryStore {
    fn query_all(&self) -> Result<Vec<Credential>> {
        let credentials = self
            .credentials
            .read()
            .map_err(|e| KeyShareError::StoreUnavailable(e.to_string()))?;
        Ok(credentials.clone())
    }
}
