//! Access credentials: AES-256-GCM sealed identity snapshots.
//!
//! Layout: `tsr1.local.` + base64url(nonce || ciphertext). The header is
//! bound as associated data, so a blob cannot be replayed under another
//! header.

use aes_gcm::{
    Aes256Gcm, KeyInit, Nonce,
    aead::{Aead, AeadCore, OsRng, Payload},
};
use base64ct::{Base64UrlUnpadded, Encoding};

use super::{ACCESS_HEADER, AccessClaims, TokenError};
use crate::keys::LocalKey;

/// Nonce length for AES-GCM (12 bytes standard)
pub const NONCE_LENGTH: usize = 12;

/// AES-GCM authentication tag length
pub const TAG_LENGTH: usize = 16;

fn cipher(key: &LocalKey) -> Result<Aes256Gcm, TokenError> {
    Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|e| TokenError::EncodingFailed {
        reason: format!("Failed to create cipher: {e}"),
    })
}

/// Seal `claims` into an access credential.
pub fn encode_access(claims: &AccessClaims, key: &LocalKey) -> Result<String, TokenError> {
    let plaintext = serde_json::to_vec(claims).map_err(|e| TokenError::EncodingFailed {
        reason: format!("Failed to serialize claims: {e}"),
    })?;

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher(key)?
        .encrypt(
            &nonce,
            Payload {
                msg: &plaintext,
                aad: ACCESS_HEADER.as_bytes(),
            },
        )
        .map_err(|e| TokenError::EncodingFailed {
            reason: format!("Encryption failed: {e}"),
        })?;

    let mut blob = Vec::with_capacity(NONCE_LENGTH + ciphertext.len());
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&ciphertext);

    Ok(format!(
        "{ACCESS_HEADER}{}",
        Base64UrlUnpadded::encode_string(&blob)
    ))
}

/// Open an access credential and check its expiry against `now` (Unix seconds).
pub fn decode_access(token: &str, key: &LocalKey, now: i64) -> Result<AccessClaims, TokenError> {
    let body = token
        .strip_prefix(ACCESS_HEADER)
        .ok_or_else(|| TokenError::Malformed {
            reason: "unexpected credential header".to_string(),
        })?;

    let blob = Base64UrlUnpadded::decode_vec(body).map_err(|e| TokenError::Malformed {
        reason: format!("invalid base64: {e}"),
    })?;

    if blob.len() < NONCE_LENGTH + TAG_LENGTH {
        return Err(TokenError::Malformed {
            reason: format!("credential too short: {} bytes", blob.len()),
        });
    }

    let (nonce, ciphertext) = blob.split_at(NONCE_LENGTH);
    let plaintext = cipher(key)?
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad: ACCESS_HEADER.as_bytes(),
            },
        )
        .map_err(|_| TokenError::IntegrityCheckFailed)?;

    let claims: AccessClaims =
        serde_json::from_slice(&plaintext).map_err(|e| TokenError::Malformed {
            reason: format!("invalid claims: {e}"),
        })?;

    if claims.is_expired_at(now) {
        return Err(TokenError::Expired {
            expired_at: claims.exp,
        });
    }

    Ok(claims)
}
