//! Credential issuance: login, renewal and password change.

use std::sync::Arc;

use crate::Clock;
use crate::config::AuthConfig;
use crate::constants::{MIN_PASSWORD_LENGTH, MIN_PASSWORD_SCORE};
use crate::keys::KeyRing;
use crate::token::{AccessClaims, RefreshClaims, decode_refresh, encode_access, encode_refresh};
use crate::user::crypto::{hash_password, verify_password};
use crate::user::{Identity, UserDirectory};

use super::errors::{AuthError, PasswordChangeError};

/// A freshly minted credential and its expiry (Unix seconds).
#[derive(Clone, PartialEq, Eq)]
pub struct IssuedCredential {
    pub token: String,
    pub expires_at: i64,
}

impl std::fmt::Debug for IssuedCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedCredential")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginGrant {
    pub identity: Identity,
    pub access: IssuedCredential,
    pub refresh: IssuedCredential,
}

/// Result of a successful renewal.
#[derive(Debug, Clone)]
pub struct RenewalGrant {
    /// Identity as currently stored, not as it was at login.
    pub identity: Identity,
    pub access: IssuedCredential,
}

/// Mints access and refresh credentials.
///
/// Holds no per-session state; everything it needs lives in the key store
/// and the identity directory, so any number of server instances can issue
/// and accept each other's credentials.
#[derive(Clone)]
pub struct CredentialIssuer {
    users: Arc<dyn UserDirectory>,
    keys: KeyRing,
    clock: Arc<dyn Clock>,
    config: Arc<AuthConfig>,
}

impl std::fmt::Debug for CredentialIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialIssuer")
            .field("users", &self.users)
            .field("keys", &self.keys)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl CredentialIssuer {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        keys: KeyRing,
        clock: Arc<dyn Clock>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            users,
            keys,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn users(&self) -> &Arc<dyn UserDirectory> {
        &self.users
    }

    /// Check a username/password pair and mint both credentials.
    ///
    /// An unknown username and a wrong password fail identically with
    /// [`AuthError::InvalidCredentials`]. Locked accounts are refused with
    /// [`AuthError::AccountLocked`], which callers must not distinguish
    /// from bad credentials when answering.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginGrant, AuthError> {
        let Some(record) = self.users.find_by_username(username).await? else {
            tracing::debug!(username, "Login for unknown username");
            return Err(AuthError::InvalidCredentials);
        };

        if let Err(e) = verify_password(password, &record.password_hash) {
            if e.is_password_mismatch() {
                tracing::debug!(username, "Login with wrong password");
                return Err(AuthError::InvalidCredentials);
            }
            return Err(e.into());
        }

        let identity = record.identity;
        if identity.is_locked {
            return Err(AuthError::AccountLocked { id: identity.id });
        }

        let now = self.clock.now_secs();
        let access = self.mint_access(&identity, now).await?;

        let refresh_exp = now + self.config.refresh_ttl_secs;
        let signing_key = self.keys.refresh_signing_key().await?;
        let refresh = IssuedCredential {
            token: encode_refresh(
                &RefreshClaims::for_subject(identity.id, now, refresh_exp),
                &signing_key,
            )?,
            expires_at: refresh_exp,
        };

        tracing::info!(
            id = identity.id,
            username = %identity.username,
            role = %identity.role,
            "Issued session credentials"
        );

        Ok(LoginGrant {
            identity,
            access,
            refresh,
        })
    }

    /// Exchange a refresh credential for a new access credential.
    ///
    /// The identity is looked up again by the subject id; nothing from the
    /// previous access credential is reused. A subject that no longer
    /// exists, or whose account is now locked, yields
    /// [`AuthError::InvalidOrExpired`].
    pub async fn refresh(&self, refresh_token: &str) -> Result<RenewalGrant, AuthError> {
        let verifying_key = self.keys.refresh_verifying_key().await?;
        let now = self.clock.now_secs();

        let claims = decode_refresh(refresh_token, &verifying_key, now)?;
        let id = claims
            .subject_id()
            .ok_or_else(|| AuthError::invalid(format!("non-numeric subject {:?}", claims.sub)))?;

        let identity = self
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AuthError::invalid(format!("subject {id} no longer exists")))?;

        if identity.is_locked {
            return Err(AuthError::invalid(format!("subject {id} is locked")));
        }

        let access = self.mint_access(&identity, now).await?;
        tracing::debug!(id, "Renewed access credential");

        Ok(RenewalGrant { identity, access })
    }

    /// Replace the password of `id` after checking the current one.
    pub async fn change_password(
        &self,
        id: i64,
        old_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<(), PasswordChangeError> {
        if new_password != confirm_password {
            return Err(PasswordChangeError::ConfirmationMismatch);
        }
        if new_password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(PasswordChangeError::TooShort {
                min: MIN_PASSWORD_LENGTH,
            });
        }
        if u8::from(zxcvbn::zxcvbn(new_password, &[]).score()) < MIN_PASSWORD_SCORE {
            return Err(PasswordChangeError::TooWeak);
        }

        let identity = self
            .users
            .find_by_id(id)
            .await
            .map_err(AuthError::from)?
            .ok_or(PasswordChangeError::NotFound { id })?;

        let record = self
            .users
            .find_by_username(&identity.username)
            .await
            .map_err(AuthError::from)?
            .ok_or(PasswordChangeError::NotFound { id })?;

        if let Err(e) = verify_password(old_password, &record.password_hash) {
            if e.is_password_mismatch() {
                return Err(PasswordChangeError::WrongPassword);
            }
            return Err(AuthError::from(e).into());
        }

        let hash = hash_password(new_password).map_err(AuthError::from)?;
        if !self
            .users
            .set_password_hash(id, hash)
            .await
            .map_err(AuthError::from)?
        {
            return Err(PasswordChangeError::NotFound { id });
        }

        tracing::info!(id, "Password changed");
        Ok(())
    }

    async fn mint_access(
        &self,
        identity: &Identity,
        now: i64,
    ) -> Result<IssuedCredential, AuthError> {
        let expires_at = now + self.config.access_ttl_secs;
        let local_key = self.keys.local_key().await?;
        let token = encode_access(
            &AccessClaims::for_identity(identity, now, expires_at),
            &local_key,
        )?;
        Ok(IssuedCredential { token, expires_at })
    }
}
