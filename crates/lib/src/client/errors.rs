//! Error types for the HTTP client.

use thiserror::Error;

use super::renewal::RenewalError;

/// Errors returned by [`ApiClient`](super::ApiClient) and
/// [`SessionStore`](super::SessionStore).
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ClientError {
    /// Base URL or request path could not be parsed.
    #[error("Invalid URL: {reason}")]
    InvalidUrl { reason: String },

    /// The request never got an answer.
    #[error("HTTP transport error: {reason}")]
    Transport {
        reason: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// The server answered with a non-success status.
    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The access credential was rejected and renewal failed. The session
    /// has been torn down.
    #[error("Session expired")]
    SessionExpired {
        #[source]
        source: RenewalError,
    },

    /// Response body was not the expected JSON.
    #[error("Failed to decode response: {reason}")]
    Decode { reason: String },
}

impl ClientError {
    /// Check if the caller is (no longer) authenticated.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Status { status: 401, .. })
            || matches!(self, ClientError::SessionExpired { .. })
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, ClientError::SessionExpired { .. })
    }

    /// HTTP status, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport {
            reason: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<ClientError> for crate::Error {
    fn from(err: ClientError) -> Self {
        crate::Error::Client(err)
    }
}
