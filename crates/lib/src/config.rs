//! Runtime configuration for credential issuance and the request gate.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    ACCESS_COOKIE, ACCESS_TTL_SECS, DEFAULT_PUBLIC_ROUTES, REFRESH_COOKIE, REFRESH_TTL_SECS,
};

/// Settings shared by the [`CredentialIssuer`](crate::auth::CredentialIssuer),
/// the [`RequestGate`](crate::auth::RequestGate) and the HTTP router.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Access credential lifetime in seconds.
    pub access_ttl_secs: i64,
    /// Refresh credential lifetime in seconds.
    pub refresh_ttl_secs: i64,
    /// Cookie carrying the access credential.
    pub access_cookie: String,
    /// Cookie carrying the refresh credential.
    pub refresh_cookie: String,
    /// Mark cookies `Secure`. Off by default so plain-HTTP development works.
    pub secure_cookies: bool,
    /// Routes that bypass the request gate. A path matches a route when it
    /// equals it or continues it with a `/` or `?`, so `/health` covers
    /// `/health/live` but not `/healthz`.
    pub public_routes: Vec<String>,
    /// Enables the `/dev/init-admin` bootstrap route.
    pub dev_mode: bool,
}

impl AuthConfig {
    pub fn access_ttl(&self) -> Duration {
        Duration::from_secs(self.access_ttl_secs.max(0) as u64)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_ttl_secs.max(0) as u64)
    }

    /// Whether `path` is on the public-route allowlist.
    ///
    /// A route matches the path itself and anything below it
    /// (`/auth/login` matches `/auth/login/` but not `/auth/loginx`).
    pub fn is_public(&self, path: &str) -> bool {
        self.public_routes.iter().any(|route| {
            path == route
                || path
                    .strip_prefix(route.as_str())
                    .is_some_and(|rest| rest.starts_with('/') || rest.starts_with('?'))
        })
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_ttl_secs: ACCESS_TTL_SECS,
            refresh_ttl_secs: REFRESH_TTL_SECS,
            access_cookie: ACCESS_COOKIE.to_string(),
            refresh_cookie: REFRESH_COOKIE.to_string(),
            secure_cookies: false,
            public_routes: DEFAULT_PUBLIC_ROUTES.iter().map(|r| r.to_string()).collect(),
            dev_mode: false,
        }
    }
}
