//! Cookie construction for both credentials.
//!
//! Every credential cookie is `HttpOnly`, `SameSite=Lax`, `Path=/`, with an
//! `Expires` equal to the credential's own expiry.

use time::OffsetDateTime;
use tower_cookies::Cookie;
use tower_cookies::cookie::SameSite;

use super::issuer::IssuedCredential;
use crate::config::AuthConfig;

fn base(name: &str, value: String, config: &AuthConfig) -> Cookie<'static> {
    Cookie::build((name.to_string(), value))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .secure(config.secure_cookies)
        .build()
}

fn credential_cookie(
    name: &str,
    credential: &IssuedCredential,
    config: &AuthConfig,
) -> Cookie<'static> {
    let mut cookie = base(name, credential.token.clone(), config);
    match OffsetDateTime::from_unix_timestamp(credential.expires_at) {
        Ok(expires) => cookie.set_expires(expires),
        // Out of range for `time`; fall back to a session cookie
        Err(e) => tracing::warn!(name, "Cookie expiry out of range: {e}"),
    }
    cookie
}

/// Cookie carrying an access credential.
pub fn access_cookie(credential: &IssuedCredential, config: &AuthConfig) -> Cookie<'static> {
    credential_cookie(&config.access_cookie, credential, config)
}

/// Cookie carrying a refresh credential.
pub fn refresh_cookie(credential: &IssuedCredential, config: &AuthConfig) -> Cookie<'static> {
    credential_cookie(&config.refresh_cookie, credential, config)
}

/// Cookie that clears `name` in the browser: empty value, `Max-Age=0`,
/// expiry in the past.
pub fn removal_cookie(name: &str, config: &AuthConfig) -> Cookie<'static> {
    let mut cookie = base(name, String::new(), config);
    cookie.make_removal();
    cookie
}
