//! Authentication error types.
//!
//! Variants carry the specific reason a credential or login was refused.
//! Those reasons are for server-side logs; at the HTTP boundary every
//! per-request authentication failure collapses into the same 401.

use thiserror::Error as ThisError;

use crate::Error;
use crate::keys::KeyError;
use crate::token::TokenError;
use crate::user::UserError;

/// Errors that can occur while issuing or checking credentials.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, ThisError)]
pub enum AuthError {
    /// Username or password did not match. Never says which.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// No access credential accompanied a gated request.
    #[error("No access credential presented")]
    MissingToken,

    /// The credential was malformed, tampered with, expired, or names an
    /// identity that no longer resolves to a usable account.
    #[error("Credential invalid or expired")]
    InvalidOrExpired {
        /// Why, for logs only
        reason: String,
    },

    /// The credential is valid but the account is locked.
    #[error("Account {id} is locked")]
    AccountLocked {
        /// Identity id
        id: i64,
    },

    /// Required key material is absent. Server misconfiguration.
    #[error("Key material missing: {name}")]
    KeyMissing {
        /// Name of the missing key
        name: String,
    },

    /// Key store failure other than a missing key.
    #[error(transparent)]
    Keys(KeyError),

    /// Identity directory failure.
    #[error(transparent)]
    Directory(UserError),

    /// Minting a credential failed.
    #[error("Credential encoding failed: {reason}")]
    Encoding {
        /// Codec error text
        reason: String,
    },
}

impl AuthError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        AuthError::InvalidOrExpired {
            reason: reason.into(),
        }
    }

    /// Check if this error is a per-request rejection (answered with 401).
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidCredentials
                | AuthError::MissingToken
                | AuthError::InvalidOrExpired { .. }
                | AuthError::AccountLocked { .. }
        )
    }

    /// Check if this error is a server fault rather than a caller problem.
    pub fn is_server_fault(&self) -> bool {
        matches!(
            self,
            AuthError::KeyMissing { .. }
                | AuthError::Keys(_)
                | AuthError::Directory(_)
                | AuthError::Encoding { .. }
        )
    }

    pub fn is_missing_token(&self) -> bool {
        matches!(self, AuthError::MissingToken)
    }

    pub fn is_invalid_or_expired(&self) -> bool {
        matches!(self, AuthError::InvalidOrExpired { .. })
    }

    pub fn is_account_locked(&self) -> bool {
        matches!(self, AuthError::AccountLocked { .. })
    }

    pub fn is_key_missing(&self) -> bool {
        matches!(self, AuthError::KeyMissing { .. })
    }

    /// Short machine-readable reason, used as a log field.
    pub fn reason_code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::MissingToken => "missing_token",
            AuthError::InvalidOrExpired { .. } => "invalid_or_expired",
            AuthError::AccountLocked { .. } => "account_locked",
            AuthError::KeyMissing { .. } => "key_missing",
            AuthError::Keys(_) => "key_store",
            AuthError::Directory(_) => "directory",
            AuthError::Encoding { .. } => "encoding",
        }
    }
}

/// Reasons a password change is refused.
#[non_exhaustive]
#[derive(Debug, ThisError)]
pub enum PasswordChangeError {
    #[error("New password and confirmation do not match")]
    ConfirmationMismatch,

    #[error("New password must be at least {min} characters")]
    TooShort { min: usize },

    #[error("Password too weak")]
    TooWeak,

    #[error("Current password is incorrect")]
    WrongPassword,

    #[error("User {id} not found")]
    NotFound { id: i64 },

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl PasswordChangeError {
    /// Check if the caller supplied unacceptable input.
    pub fn is_rejected_input(&self) -> bool {
        matches!(
            self,
            PasswordChangeError::ConfirmationMismatch
                | PasswordChangeError::TooShort { .. }
                | PasswordChangeError::TooWeak
                | PasswordChangeError::WrongPassword
        )
    }
}

impl From<KeyError> for AuthError {
    fn from(err: KeyError) -> Self {
        match err {
            KeyError::Missing { name } => AuthError::KeyMissing { name },
            other => AuthError::Keys(other),
        }
    }
}

impl From<UserError> for AuthError {
    fn from(err: UserError) -> Self {
        AuthError::Directory(err)
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::EncodingFailed { reason } => AuthError::Encoding { reason },
            other => AuthError::InvalidOrExpired {
                reason: other.to_string(),
            },
        }
    }
}

// Conversion from AuthError to the main Error type
impl From<AuthError> for Error {
    fn from(err: AuthError) -> Self {
        Error::Auth(err)
    }
}
