//!
//! Tessera: first-party password sessions for HTTP services.
//!
//! ## Core Concepts
//!
//! * **Key material (`keys::KeyStore`)**: A durable key/value store shared by every
//!   server instance, holding the symmetric access key and the refresh signing pair.
//!   Keys are created once at startup by `keys::ensure_keys`.
//! * **Credentials (`token`)**: Access credentials are AES-256-GCM sealed identity
//!   snapshots living one day; refresh credentials are Ed25519-signed subject ids
//!   living seven days. Both travel in `HttpOnly` cookies.
//! * **Issuance (`auth::CredentialIssuer`)**: Password login, renewal and password change.
//! * **Gate (`auth::RequestGate`)**: Per-request check that re-reads the identity from
//!   the `user::UserDirectory`, so locks and role changes apply immediately.
//! * **Server (`server::router`)**: The axum routes wiring the above together.
//! * **Client (`client::SessionStore`)**: A reqwest-based client that renews expired
//!   sessions with at most one refresh call in flight and replays waiting requests.

pub mod auth;
pub mod client;
pub mod clock;
pub mod config;
pub mod constants;
pub mod keys;
pub mod server;
pub mod token;
pub mod user;

#[cfg(any(test, feature = "testing"))]
pub use clock::FixedClock;
pub use clock::{Clock, SystemClock};

/// Result type used throughout the Tessera library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Tessera library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Structured key storage errors from the keys module
    #[error(transparent)]
    Key(keys::KeyError),

    /// Structured codec errors from the token module
    #[error(transparent)]
    Token(token::TokenError),

    /// Structured identity errors from the user module
    #[error(transparent)]
    User(user::UserError),

    /// Structured authentication errors from the auth module
    #[error(transparent)]
    Auth(auth::AuthError),

    /// Structured client errors from the client module
    #[error(transparent)]
    Client(client::ClientError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Key(_) => "keys",
            Error::Token(_) => "token",
            Error::User(_) => "user",
            Error::Auth(_) => "auth",
            Error::Client(_) => "client",
        }
    }

    /// Check if this error indicates a required key is absent.
    pub fn is_key_missing(&self) -> bool {
        match self {
            Error::Key(key_err) => key_err.is_missing(),
            Error::Auth(auth_err) => auth_err.is_key_missing(),
            _ => false,
        }
    }

    /// Check if this error is authentication-related.
    pub fn is_authentication_error(&self) -> bool {
        match self {
            Error::Auth(auth_err) => auth_err.is_unauthorized(),
            Error::Token(token_err) => token_err.is_invalid_or_expired(),
            Error::Client(client_err) => client_err.is_unauthorized(),
            _ => false,
        }
    }

    /// Check if this error indicates a conflict (already exists).
    pub fn is_conflict(&self) -> bool {
        match self {
            Error::User(user_err) => user_err.is_conflict(),
            _ => false,
        }
    }

    /// Check if this error came from the key store backend.
    pub fn is_storage_error(&self) -> bool {
        match self {
            Error::Key(key_err) => key_err.is_backend_error(),
            Error::Auth(auth::AuthError::Keys(key_err)) => key_err.is_backend_error(),
            _ => false,
        }
    }
}
