//! Session authentication.
//!
//! - [`CredentialIssuer`] mints access and refresh credentials on login and
//!   renewal.
//! - [`RequestGate`] and the [`require_session`] middleware check the access
//!   credential on every non-public request and attach the live identity.
//! - [`cookies`] builds the `Set-Cookie` values for both credentials.

pub mod cookies;
mod context;
pub mod errors;
mod gate;
mod issuer;

pub use context::{AdminUser, AuthContext, CurrentUser};
pub use errors::{AuthError, PasswordChangeError};
pub use gate::{RequestGate, require_session};
pub use issuer::{CredentialIssuer, IssuedCredential, LoginGrant, RenewalGrant};
