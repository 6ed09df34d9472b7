//! Keyshare - browse and export stored identities as PKCS #12 files.
//!
//! Identities (certificate + private key) held in a credential store are
//! projected into a small virtual hierarchy of folders, zip bundles and files,
//! and packaged on demand into password-protected containers. The shared
//! export password is generated once and kept in a secret store.

pub mod attributes;
pub mod classifier;
pub mod config;
pub mod credential;
pub mod crypto;
pub mod error;
pub mod filter;
pub mod host;
pub mod identifier;
pub mod keychain;
pub mod logging;
pub mod namespace;
pub mod package;
pub mod secret;
pub mod shell;
pub mod storage;
pub mod store;

// Re-export commonly used types
pub use config::AppConfig;
pub use credential::{Category, Credential};
pub use error::{KeyShareError, Result};
pub use filter::{Filter, Presentation};
pub use host::KeyShare;
pub use identifier::Identifier;
pub use keychain::{IdentityRecord, Keychain};
pub use logging::{LogConfig, init_logging};
pub use namespace::{NodeKind, VirtualNode};
pub use secret::{PasswordService, SecretManager, SecretStore};
pub use shell::Shell;
pub use store::CredentialStore;
