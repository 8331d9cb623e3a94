//! Credential codec.
//!
//! Two credential kinds, both opaque strings carried in cookies:
//!
//! * **Access** credentials are sealed with AES-256-GCM under the shared
//!   `localKey`. They carry an identity snapshot (`id`, `username`, `role`)
//!   and live for one day.
//! * **Refresh** credentials are signed with Ed25519. They carry only the
//!   subject id, forcing a fresh identity lookup on renewal, and live for
//!   seven days.
//!
//! The codec is pure: keys and the current time are passed in.

mod access;
mod errors;
mod refresh;

use serde::{Deserialize, Serialize};

pub use access::{decode_access, encode_access};
pub use errors::TokenError;
pub use refresh::{decode_refresh, encode_refresh};

use crate::user::{Identity, Role};

/// Header of access credentials.
pub const ACCESS_HEADER: &str = "tsr1.local.";

/// Header of refresh credentials.
pub const REFRESH_HEADER: &str = "tsr1.public.";

/// Identity snapshot sealed inside an access credential.
///
/// The snapshot may be stale; authorization decisions use the live record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub id: i64,
    pub username: String,
    pub role: Role,
    /// Issued at, Unix seconds.
    pub iat: i64,
    /// Expires at, Unix seconds.
    pub exp: i64,
}

impl AccessClaims {
    pub fn for_identity(identity: &Identity, issued_at: i64, expires_at: i64) -> Self {
        Self {
            id: identity.id,
            username: identity.username.clone(),
            role: identity.role,
            iat: issued_at,
            exp: expires_at,
        }
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.exp
    }
}

/// Claims signed inside a refresh credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// Identity id, as a decimal string.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

impl RefreshClaims {
    pub fn for_subject(id: i64, issued_at: i64, expires_at: i64) -> Self {
        Self {
            sub: id.to_string(),
            iat: issued_at,
            exp: expires_at,
        }
    }

    /// Numeric identity id, `None` if the subject is not a number.
    pub fn subject_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.exp
    }
}
