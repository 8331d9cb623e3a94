//! HTTP surface.
//!
//! | Route                        | Gated | Purpose                              |
//! |------------------------------|-------|--------------------------------------|
//! | `POST /auth/login`           | no    | password login, sets both cookies    |
//! | `POST /auth/refresh`         | no    | new access cookie from refresh cookie|
//! | `POST /auth/logout`          | no    | clears both cookies                  |
//! | `GET /auth/me`               | yes   | current identity                     |
//! | `PATCH /auth/change-password`| yes   | replace own password                 |
//! | `GET /admin/whoami`          | admin | current identity, admins only        |
//! | `POST /dev/init-admin`       | no    | seed the admin account in dev mode   |
//! | `GET /health`                | no    | liveness                             |

mod error;
mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::{get, patch, post};
use tower_cookies::CookieManagerLayer;

use crate::Clock;
use crate::auth::{CredentialIssuer, RequestGate, require_session};
use crate::config::AuthConfig;
use crate::constants::{
    ADMIN_WHOAMI_PATH, CHANGE_PASSWORD_PATH, DEFAULT_ADMIN_PASSWORD, HEALTH_PATH, INIT_ADMIN_PATH,
    LOGIN_PATH, LOGOUT_PATH, ME_PATH, REFRESH_PATH,
};
use crate::keys::KeyRing;
use crate::user::UserDirectory;

pub use error::{ApiError, LOGIN_FAILED_MESSAGE};
pub use handlers::{ChangePasswordRequest, LoginRequest, UserEnvelope};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub issuer: CredentialIssuer,
    pub gate: RequestGate,
    pub users: Arc<dyn UserDirectory>,
    bootstrap_password: Arc<str>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("issuer", &self.issuer)
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Wire an issuer and a gate over the same collaborators.
    pub fn new(
        users: Arc<dyn UserDirectory>,
        keys: KeyRing,
        clock: Arc<dyn Clock>,
        config: AuthConfig,
    ) -> Self {
        let config = Arc::new(config);
        let issuer =
            CredentialIssuer::new(users.clone(), keys.clone(), clock.clone(), config.clone());
        Self {
            issuer,
            gate: RequestGate::new(users.clone(), keys, clock, config),
            users,
            bootstrap_password: Arc::from(DEFAULT_ADMIN_PASSWORD),
        }
    }

    /// Password used when `/dev/init-admin` creates the admin account.
    pub fn with_bootstrap_password(mut self, password: impl Into<String>) -> Self {
        self.bootstrap_password = Arc::from(password.into());
        self
    }
}

/// Build the router with the request gate applied to every route.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(LOGIN_PATH, post(handlers::login))
        .route(REFRESH_PATH, post(handlers::refresh))
        .route(LOGOUT_PATH, post(handlers::logout))
        .route(ME_PATH, get(handlers::me))
        .route(CHANGE_PASSWORD_PATH, patch(handlers::change_password))
        .route(ADMIN_WHOAMI_PATH, get(handlers::admin_whoami))
        .route(INIT_ADMIN_PATH, post(handlers::init_admin))
        .route(HEALTH_PATH, get(handlers::health))
        .layer(middleware::from_fn_with_state(
            state.gate.clone(),
            require_session,
        ))
        .layer(CookieManagerLayer::new())
        .with_state(state)
}
