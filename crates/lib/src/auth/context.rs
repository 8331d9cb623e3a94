//! Typed per-request authentication context.
//!
//! The [`require_session`](super::require_session) middleware is the only
//! writer of [`AuthContext`]. Handlers read it through the [`CurrentUser`]
//! and [`AdminUser`] extractors.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::server::ApiError;
use crate::user::Identity;

/// Identity resolved by the request gate for the current request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub identity: Identity,
}

/// The authenticated identity of the current request.
///
/// Rejects with 401 if the request did not pass through the gate.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .map(|ctx| CurrentUser(ctx.identity.clone()))
            .ok_or(ApiError::Unauthorized)
    }
}

/// Like [`CurrentUser`], but answers 403 for non-admin identities.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Identity);

impl<S: Send + Sync> FromRequestParts<S> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentUser(identity) = CurrentUser::from_request_parts(parts, state).await?;
        if !identity.is_admin() {
            tracing::warn!(id = identity.id, role = %identity.role, "Admin route refused");
            return Err(ApiError::Forbidden);
        }
        Ok(AdminUser(identity))
    }
}
