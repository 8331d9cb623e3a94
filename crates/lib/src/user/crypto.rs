//! Password hashing
//!
//! Argon2id with a random salt per hash, stored as a PHC string.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core},
};

use super::errors::UserError;

/// Hash a password using Argon2id
///
/// # Returns
/// The Argon2 hash string (PHC format), salt included
pub fn hash_password(password: impl AsRef<str>) -> Result<String, UserError> {
    let salt = SaltString::generate(&mut rand_core::OsRng);

    Argon2::default()
        .hash_password(password.as_ref().as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| UserError::HashingFailed {
            reason: format!("Password hashing failed: {e}"),
        })
}

/// Verify a password against its hash
///
/// Comparison of the derived hash is constant-time inside `argon2`.
pub fn verify_password(
    password: impl AsRef<str>,
    password_hash: impl AsRef<str>,
) -> Result<(), UserError> {
    let parsed_hash = PasswordHash::new(password_hash.as_ref())
        .map_err(|_| UserError::PasswordVerificationFailed)?;

    Argon2::default()
        .verify_password(password.as_ref().as_bytes(), &parsed_hash)
        .map_err(|_| UserError::InvalidPassword)
}
