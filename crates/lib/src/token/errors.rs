//! Error types for credential encoding and decoding.

use thiserror::Error;

/// Errors produced by the token codec.
///
/// Every decode failure is deliberately coarse: callers collapse all of them
/// into a single "invalid or expired" outcome.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum TokenError {
    /// Wrong prefix, bad base64, truncated blob or unparsable claims.
    #[error("Malformed credential: {reason}")]
    Malformed { reason: String },

    /// Authentication tag or signature did not verify.
    #[error("Credential integrity check failed")]
    IntegrityCheckFailed,

    /// The credential verified but its expiry has passed.
    #[error("Credential expired at {expired_at}")]
    Expired { expired_at: i64 },

    /// Encoding a credential failed.
    #[error("Credential encoding failed: {reason}")]
    EncodingFailed { reason: String },
}

impl TokenError {
    /// Check if this error means the presented credential must be rejected.
    pub fn is_invalid_or_expired(&self) -> bool {
        matches!(
            self,
            TokenError::Malformed { .. }
                | TokenError::IntegrityCheckFailed
                | TokenError::Expired { .. }
        )
    }

    pub fn is_expired(&self) -> bool {
        matches!(self, TokenError::Expired { .. })
    }
}

impl From<TokenError> for crate::Error {
    fn from(err: TokenError) -> Self {
        crate::Error::Token(err)
    }
}
