//! Error types for key storage and key loading.

use thiserror::Error;

/// Errors raised while reading, writing or interpreting key material.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum KeyError {
    /// A required key is not present in the store.
    #[error("Key missing from key store: {name}")]
    Missing { name: String },

    /// Stored bytes could not be turned into a usable key.
    #[error("Malformed key {name}: {reason}")]
    Malformed { name: String, reason: String },

    /// The stored refresh key pair does not belong together.
    #[error("Refresh key pair mismatch: stored public key does not match the stored private key")]
    PairMismatch,

    /// SQL store failure.
    #[cfg(any(feature = "sqlite", feature = "postgres"))]
    #[error("Key store SQL error: {reason}")]
    Sql {
        reason: String,
        #[source]
        source: Option<sqlx::Error>,
    },
}

impl KeyError {
    /// Check if this error indicates a key is absent.
    pub fn is_missing(&self) -> bool {
        matches!(self, KeyError::Missing { .. })
    }

    /// Check if this error came from the storage backend rather than the key bytes.
    pub fn is_backend_error(&self) -> bool {
        #[cfg(any(feature = "sqlite", feature = "postgres"))]
        if let KeyError::Sql { .. } = self {
            return true;
        }
        false
    }
}

impl From<KeyError> for crate::Error {
    fn from(err: KeyError) -> Self {
        crate::Error::Key(err)
    }
}
