//! JSON error responses.
//!
//! Every body has the shape `{"error": "..."}`. Authentication failures
//! never say why they failed.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::auth::{AuthError, PasswordChangeError};

/// Message returned for any failed login.
pub const LOGIN_FAILED_MESSAGE: &str = "invalid username or password";

/// Errors surfaced to HTTP callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Generic 401 for every gated-request rejection.
    Unauthorized,
    /// 401 for a failed login.
    InvalidCredentials,
    Forbidden,
    BadRequest(String),
    NotFound(String),
    /// 500 with a generic body; details go to the log.
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &str {
        match self {
            ApiError::Unauthorized => "unauthorized",
            ApiError::InvalidCredentials => LOGIN_FAILED_MESSAGE,
            ApiError::Forbidden => "forbidden",
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) => msg,
            ApiError::Internal => "internal server error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(serde_json::json!({"error": self.message()})),
        )
            .into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        if err.is_server_fault() {
            tracing::error!(reason = err.reason_code(), "Authentication failure: {err}");
            ApiError::Internal
        } else {
            ApiError::Unauthorized
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

impl From<PasswordChangeError> for ApiError {
    fn from(err: PasswordChangeError) -> Self {
        if err.is_rejected_input() {
            return ApiError::BadRequest(err.to_string());
        }
        match err {
            PasswordChangeError::NotFound { .. } => ApiError::NotFound("user not found".to_string()),
            PasswordChangeError::Auth(e) => e.into(),
            other => {
                tracing::error!("Password change failed: {other}");
                ApiError::Internal
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(status = %rejection.status(), "Rejected request body");
        ApiError::BadRequest(rejection.body_text())
    }
}
