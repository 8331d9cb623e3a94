//! Error types for the identity directory
use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum UserError {
    #[error("Username already exists: {username}")]
    UsernameAlreadyExists { username: String },

    #[error("Invalid password")]
    InvalidPassword,

    #[error("Password verification failed")]
    PasswordVerificationFailed,

    #[error("Password hashing failed: {reason}")]
    HashingFailed { reason: String },
}

impl UserError {
    /// Check if this error is a password mismatch (wrong password or unusable hash).
    pub fn is_password_mismatch(&self) -> bool {
        matches!(
            self,
            UserError::InvalidPassword | UserError::PasswordVerificationFailed
        )
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, UserError::UsernameAlreadyExists { .. })
    }
}

impl From<UserError> for crate::Error {
    fn from(err: UserError) -> Self {
        crate::Error::User(err)
    }
}
