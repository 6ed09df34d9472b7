//! Namespace host: enumeration and resolution over live store state.
//!
//! Every call takes a fresh snapshot from the credential store; nothing is
//! cached between calls except the export password, which lives in the secret
//! store.

use std::sync::Arc;

use crate::attributes;
use crate::classifier;
use crate::credential::Credential;
use crate::error::{KeyShareError, Result};
use crate::filter::{Filter, Presentation};
use crate::identifier::Identifier;
use crate::logging::timed;
use crate::namespace::{self, VirtualNode};
use crate::package;
use crate::secret::{PasswordService, SecretManager, SecretStore};
use crate::store::CredentialStore;

/// Entry point for browsing and exporting credentials.
#[derive(Clone)]
pub struct KeyShare {
    store: Arc<dyn CredentialStore>,
    secrets: SecretManager,
}

impl KeyShare {
    pub fn new(store: Arc<dyn CredentialStore>, secret_store: Arc<dyn SecretStore>) -> Self {
        Self {
            store,
            secrets: SecretManager::new(secret_store),
        }
    }

    /// The current store contents; empty if the store cannot be queried.
    pub fn snapshot(&self) -> Vec<Credential> {
        match self.store.query_all() {
            Ok(credentials) => credentials,
            Err(e) => {
                log::error!("Credential store query failed, presenting empty set: {}", e);
                Vec::new()
            }
        }
    }

    /// Lists the children of `container`: the root (`""`) or a folder.
    pub fn enumerate(&self, container: &str) -> Result<Vec<VirtualNode>> {
        let identifier = parse(container)?;
        let credentials = self.snapshot();
        let password = self.secrets.get_or_create_password();

        match identifier {
            Identifier::Root => Ok(timed("Root enumeration", || {
                namespace::enumerate_root(&credentials, &password)
            })),
            Identifier::Folder(filter) => {
                Ok(namespace::folder_leaves(&credentials, filter, &password))
            }
            other => {
                log::warn!("Cannot enumerate '{}': not a container", other);
                Err(KeyShareError::NotFound(container.to_string()))
            }
        }
    }

    /// Projects a single view over the current store.
    pub fn project(&self, filter: Filter, presentation: Presentation) -> Vec<VirtualNode> {
        let credentials = self.snapshot();
        let password = self.secrets.get_or_create_password();
        namespace::project(&credentials, filter, presentation, &password)
    }

    /// Rebuilds the node named by `identifier`.
    pub fn item(&self, identifier: &str) -> Result<VirtualNode> {
        let decoded = parse(identifier)?;
        let not_found = || KeyShareError::NotFound(identifier.to_string());

        match decoded {
            Identifier::Root => Ok(namespace::root_node()),
            Identifier::Folder(filter) => Ok(namespace::folder_node(filter)),
            Identifier::Zip(filter) => {
                let credentials = self.snapshot();
                let password = self.secrets.get_or_create_password();
                namespace::zip_node(&credentials, filter, &password).ok_or_else(not_found)
            }
            Identifier::Leaf {
                folder: None,
                credential_id,
            } => {
                let credential = self.credential(&credential_id)?;
                let password = self.secrets.get_or_create_password();
                namespace::leaf_node(&credential, None, &password).ok_or_else(not_found)
            }
            Identifier::Leaf {
                folder: Some(filter),
                credential_id,
            } => {
                // only what the folder lists has the folder as its parent
                let credentials = self.query_for(identifier)?;
                let Some(credential) = classifier::select(&credentials, filter)
                    .into_iter()
                    .find(|c| c.id == credential_id)
                else {
                    log::warn!("'{}' is not listed under {}", credential_id, filter);
                    return Err(not_found());
                };
                let password = self.secrets.get_or_create_password();
                namespace::leaf_node(credential, Some(filter), &password).ok_or_else(not_found)
            }
        }
    }

    /// Produces the export bytes for a zip or leaf identifier.
    pub fn resolve(&self, identifier: &str) -> Result<Vec<u8>> {
        let decoded = parse(identifier)?;

        match decoded {
            Identifier::Zip(filter) => {
                let credentials = self.query_for(identifier)?;
                let password = self.secrets.get_or_create_password();
                let selected = classifier::select(&credentials, filter);
                let archive = timed(&format!("Archive for {}", filter), || {
                    package::build_archive(selected, &password)
                })?;
                log::info!(
                    "Resolved '{}' to {} bytes ({} entries)",
                    identifier,
                    archive.len(),
                    archive.entries.len()
                );
                Ok(archive.bytes)
            }
            Identifier::Leaf { credential_id, .. } => {
                let credential = self.credential(&credential_id)?;
                let password = self.secrets.get_or_create_password();
                let container = package::build_container(&credential, &password)
                    .inspect_err(|e| log::error!("Cannot resolve '{}': {}", identifier, e))?;
                log::info!(
                    "Resolved '{}' to {} bytes",
                    identifier,
                    container.bytes.len()
                );
                Ok(container.bytes)
            }
            Identifier::Root | Identifier::Folder(_) => {
                log::warn!("Cannot resolve '{}': not a file", identifier);
                Err(KeyShareError::NotFound(identifier.to_string()))
            }
        }
    }

    /// Looks a credential up by id in the current store.
    pub fn credential(&self, id: &str) -> Result<Credential> {
        self.query_for(id)?
            .into_iter()
            .find(|c| c.id == id)
            .ok_or_else(|| {
                log::warn!("No credential with id '{}'", id);
                KeyShareError::NotFound(id.to_string())
            })
    }

    /// Human-readable attribute rows for a credential.
    pub fn attributes(&self, id: &str) -> Result<Vec<(String, String)>> {
        Ok(attributes::present(&self.credential(id)?.attributes))
    }

    /// The shared export password, generated on first use.
    pub fn export_password(&self) -> String {
        self.secrets.get_or_create_password()
    }

    pub fn password_service(&self) -> PasswordService {
        PasswordService::new(self.secrets.clone())
    }

    /// Store query for a resolution request: failures read as not found.
    fn query_for(&self, identifier: &str) -> Result<Vec<Credential>> {
        self.store.query_all().map_err(|e| {
            log::error!("Cannot resolve '{}': {}", identifier, e);
            KeyShareError::NotFound(identifier.to_string())
        })
    }
}

fn parse(identifier: &str) -> Result<Identifier> {
    identifier.parse::<Identifier>().inspect_err(|_| {
        log::warn!("Unrecognised identifier '{}'", identifier);
    })
}
