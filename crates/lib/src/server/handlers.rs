//! Route handlers.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower_cookies::Cookies;

use crate::auth::cookies::{access_cookie, refresh_cookie, removal_cookie};
use crate::auth::{AdminUser, AuthError, CurrentUser};
use crate::constants::DEFAULT_ADMIN_USERNAME;
use crate::user::{Identity, SeedOutcome, seed_admin};

use super::AppState;
use super::error::ApiError;

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Body of successful login and refresh responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEnvelope {
    pub user: Identity,
}

/// Password change request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// POST /auth/login
pub(super) async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<UserEnvelope>, ApiError> {
    let Json(body) = body?;
    let config = state.issuer.config();
    match state.issuer.login(&body.username, &body.password).await {
        Ok(grant) => {
            cookies.add(access_cookie(&grant.access, config));
            cookies.add(refresh_cookie(&grant.refresh, config));
            Ok(Json(UserEnvelope {
                user: grant.identity,
            }))
        }
        Err(e) if e.is_unauthorized() => {
            tracing::info!(username = %body.username, reason = e.reason_code(), "Login refused");
            Err(ApiError::InvalidCredentials)
        }
        Err(e) => Err(e.into()),
    }
}

/// POST /auth/refresh
pub(super) async fn refresh(
    State(state): State<AppState>,
    cookies: Cookies,
) -> Result<Json<UserEnvelope>, ApiError> {
    let config = state.issuer.config();
    let token = cookies
        .get(&config.refresh_cookie)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty());

    let Some(token) = token else {
        tracing::debug!("Refresh without credential");
        return Err(AuthError::MissingToken.into());
    };

    match state.issuer.refresh(&token).await {
        Ok(grant) => {
            cookies.add(access_cookie(&grant.access, config));
            Ok(Json(UserEnvelope {
                user: grant.identity,
            }))
        }
        Err(e) => {
            if let AuthError::InvalidOrExpired { reason } = &e {
                tracing::warn!(%reason, "Refresh refused");
            }
            Err(e.into())
        }
    }
}

/// POST /auth/logout
///
/// Always clears both cookies and answers 204.
pub(super) async fn logout(State(state): State<AppState>, cookies: Cookies) -> StatusCode {
    let config = state.issuer.config();
    cookies.add(removal_cookie(&config.access_cookie, config));
    cookies.add(removal_cookie(&config.refresh_cookie, config));
    StatusCode::NO_CONTENT
}

/// GET /auth/me
pub(super) async fn me(CurrentUser(identity): CurrentUser) -> Json<Identity> {
    Json(identity)
}

/// PATCH /auth/change-password
pub(super) async fn change_password(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    body: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body?;
    state
        .issuer
        .change_password(
            identity.id,
            &body.old_password,
            &body.new_password,
            &body.confirm_password,
        )
        .await?;
    Ok(Json(json!({"message": "password updated"})))
}

/// GET /admin/whoami
pub(super) async fn admin_whoami(AdminUser(identity): AdminUser) -> Json<Identity> {
    Json(identity)
}

/// POST /dev/init-admin
pub(super) async fn init_admin(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    if !state.issuer.config().dev_mode {
        tracing::warn!("Admin bootstrap requested outside dev mode");
        return Err(ApiError::Forbidden);
    }

    let outcome = seed_admin(
        state.users.as_ref(),
        DEFAULT_ADMIN_USERNAME,
        &state.bootstrap_password,
    )
    .await
    .map_err(|e| {
        tracing::error!("Admin bootstrap failed: {e}");
        ApiError::Internal
    })?;

    Ok(Json(match outcome {
        SeedOutcome::Created(identity) => json!({
            "message": "admin account created",
            "user": identity,
        }),
        SeedOutcome::Skipped => json!({"message": "admin account already exists"}),
    }))
}

/// GET /health
pub(super) async fn health() -> Json<Value> {
    Json(json!({"status": "healthy"}))
}
