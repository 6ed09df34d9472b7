//! Credential snapshots supplied by a credential store.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::attributes::Attributes;

/// Intended use of a credential, derived by the store from certificate contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Authentication,
    Signature,
    Encryption,
    Device,
    Unknown,
}

impl Category {
    /// Prefix used in export file names.
    pub fn file_label(&self) -> &'static str {
        match self {
            Category::Authentication => "piv",
            Category::Signature => "signature",
            Category::Encryption => "encryption",
            Category::Device => "device",
            Category::Unknown => "unknown",
        }
    }

    /// Human-readable title, e.g. "PIV certificate".
    pub fn title(&self) -> &'static str {
        match self {
            Category::Authentication => "PIV certificate",
            Category::Signature => "Signature certificate",
            Category::Encryption => "Encryption certificate",
            Category::Device => "Device certificate",
            Category::Unknown => "Unknown certificate",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_label())
    }
}

/// One identity (certificate + private key) available for export.
///
/// Instances are read-only snapshots; nothing in this crate writes them back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub id: String,
    pub category: Category,
    /// Seconds since the Unix epoch, 0 when unavailable.
    pub not_before: i64,
    pub serial: Option<String>,
    pub certificate: Vec<u8>,
    pub private_key: Vec<u8>,
    pub attributes: Attributes,
}

impl Credential {
    /// Creates a credential whose id is derived from `label` and the certificate.
    pub fn new(
        label: Option<&str>,
        category: Category,
        not_before: i64,
        serial: Option<String>,
        certificate: Vec<u8>,
        private_key: Vec<u8>,
    ) -> Self {
        Self {
            id: Self::derive_id(label, &certificate),
            category,
            not_before,
            serial,
            certificate,
            private_key,
            attributes: Attributes::new(),
        }
    }

    /// Attaches the raw attribute set shown by the attribute presenter.
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// The label when present and non-empty, else the upper-case hex SHA-256
    /// of the certificate bytes.
    pub fn derive_id(label: Option<&str>, certificate: &[u8]) -> String {
        match label {
            Some(label) if !label.is_empty() => label.to_string(),
            _ => hex::encode_upper(Sha256::digest(certificate)),
        }
    }

    /// `<category>_<serial>.p12`, with an empty serial when absent.
    pub fn export_filename(&self) -> String {
        format!(
            "{}_{}.p12",
            self.category.file_label(),
            self.serial.as_deref().unwrap_or("")
        )
    }
}
