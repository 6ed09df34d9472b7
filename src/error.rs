//! Error taxonomy for projection and packaging.
//!
//! Classification and projection never fail: absence of data is an empty
//! collection. These variants surface only from packaging, resolution and the
//! store/secret boundaries.

use thiserror::Error;

/// Errors produced by the key sharing core.
#[derive(Debug, Error)]
pub enum KeyShareError {
    /// The identifier does not name any known node or credential.
    #[error("'{0}' not found")]
    NotFound(String),

    /// Certificate or private key payload is missing or unparseable.
    #[error("credential '{id}' is malformed: {reason}")]
    MalformedCredential { id: String, reason: String },

    /// A newly generated export password could not be persisted.
    #[error("secret unavailable: {0}")]
    SecretUnavailable(String),

    /// The credential store could not be queried.
    #[error("credential store unavailable: {0}")]
    StoreUnavailable(String),

    /// The zip writer failed while assembling an archive.
    #[error("archive assembly failed: {0}")]
    Archive(String),
}

impl KeyShareError {
    /// Shorthand for a [`KeyShareError::MalformedCredential`].
    pub fn malformed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        KeyShareError::MalformedCredential {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Returns true for [`KeyShareError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, KeyShareError::NotFound(_))
    }
}

impl From<zip::result::ZipError> for KeyShareError {
    fn from(err: zip::result::ZipError) -> Self {
        KeyShareError::Archive(err.to_string())
    }
}

impl From<std::io::Error> for KeyShareError {
    fn from(err: std::io::Error) -> Self {
        KeyShareError::Archive(err.to_string())
    }
}

/// Result alias for the key sharing core.
pub type Result<T> = std::result::Result<T, KeyShareError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = KeyShareError::NotFound("PIV.abc".to_string());
        assert_eq!(err.to_string(), "'PIV.abc' not found");
        assert!(err.is_not_found());

        let err = KeyShareError::malformed("abc", "empty private key");
        assert_eq!(
            err.to_string(),
            "credential 'abc' is malformed: empty private key"
        );
        assert!(!err.is_not_found());
    }
}
