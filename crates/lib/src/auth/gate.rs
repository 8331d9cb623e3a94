//! Per-request credential check.
//!
//! Every request outside the public-route allowlist must carry an access
//! credential that decodes under the current `localKey` and names an
//! identity that still exists and is not locked. The identity attached to
//! the request is always the live record, never the credential snapshot.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tower_cookies::Cookies;

use crate::Clock;
use crate::config::AuthConfig;
use crate::keys::KeyRing;
use crate::token::decode_access;
use crate::user::{Identity, UserDirectory};

use super::context::AuthContext;
use super::errors::AuthError;

/// Validates access credentials against keys and live identity state.
#[derive(Clone)]
pub struct RequestGate {
    users: Arc<dyn UserDirectory>,
    keys: KeyRing,
    clock: Arc<dyn Clock>,
    config: Arc<AuthConfig>,
}

impl std::fmt::Debug for RequestGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestGate")
            .field("public_routes", &self.config.public_routes)
            .finish_non_exhaustive()
    }
}

impl RequestGate {
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

    /// Resolve an access credential to the live identity it names.
    ///
    /// Fails with `MissingToken` when no credential is given,
    /// `InvalidOrExpired` when it does not decode or its subject is gone,
    /// and `AccountLocked` when the subject is locked.
    pub async fn authenticate(&self, token: Option<&str>) -> Result<Identity, AuthError> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;

        let local_key = self.keys.local_key().await?;
        let claims = decode_access(token, &local_key, self.clock.now_secs())?;

        let identity = self
            .users
            .find_by_id(claims.id)
            .await?
            .ok_or_else(|| AuthError::invalid(format!("identity {} no longer exists", claims.id)))?;

        if identity.is_locked {
            return Err(AuthError::AccountLocked { id: identity.id });
        }

        Ok(identity)
    }
}

/// Axum middleware enforcing the [`RequestGate`].
///
/// Install with `axum::middleware::from_fn_with_state(gate, require_session)`
/// inside a `CookieManagerLayer`. Public routes pass through untouched; all
/// other requests either get an [`AuthContext`] extension or a generic 401.
pub async fn require_session(
    State(gate): State<RequestGate>,
    cookies: Cookies,
    mut req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();
    if gate.config.is_public(&path) {
        return next.run(req).await;
    }

    let token = cookies
        .get(&gate.config.access_cookie)
        .map(|c| c.value().to_string());

    match gate.authenticate(token.as_deref()).await {
        Ok(identity) => {
            tracing::trace!(%path, id = identity.id, "Request authorized");
            req.extensions_mut().insert(AuthContext { identity });
            next.run(req).await
        }
        Err(e) if e.is_server_fault() => {
            tracing::error!(%path, reason = e.reason_code(), "Request gate failure: {e}");
            crate::server::ApiError::Internal.into_response()
        }
        Err(e) => {
            let reason = e.reason_code();
            match &e {
                AuthError::MissingToken => tracing::debug!(%path, reason, "Request rejected"),
                AuthError::InvalidOrExpired { reason: detail } => {
                    tracing::warn!(%path, reason, %detail, "Request rejected")
                }
                _ => tracing::warn!(%path, reason, "Request rejected: {e}"),
            }
            e.into_response()
        }
    }
}
