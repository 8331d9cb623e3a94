//! Refresh credentials: Ed25519-signed subject claims.
//!
//! Layout: `tsr1.public.` + base64url(json || signature). The signature
//! covers the header followed by the JSON payload.

use base64ct::{Base64UrlUnpadded, Encoding};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};

use super::{REFRESH_HEADER, RefreshClaims, TokenError};

/// Size of Ed25519 signatures in bytes
pub const ED25519_SIGNATURE_SIZE: usize = 64;

fn signing_input(payload: &[u8]) -> Vec<u8> {
    let mut input = Vec::with_capacity(REFRESH_HEADER.len() + payload.len());
    input.extend_from_slice(REFRESH_HEADER.as_bytes());
    input.extend_from_slice(payload);
    input
}

/// Sign `claims` into a refresh credential.
pub fn encode_refresh(claims: &RefreshClaims, key: &SigningKey) -> Result<String, TokenError> {
    let payload = serde_json::to_vec(claims).map_err(|e| TokenError::EncodingFailed {
        reason: format!("Failed to serialize claims: {e}"),
    })?;
    let signature: Signature = key.sign(&signing_input(&payload));

    let mut blob = payload;
    blob.extend_from_slice(&signature.to_bytes());

    Ok(format!(
        "{REFRESH_HEADER}{}",
        Base64UrlUnpadded::encode_string(&blob)
    ))
}

/// Verify a refresh credential and check its expiry against `now` (Unix seconds).
pub fn decode_refresh(
    token: &str,
    key: &VerifyingKey,
    now: i64,
) -> Result<RefreshClaims, TokenError> {
    let body = token
        .strip_prefix(REFRESH_HEADER)
        .ok_or_else(|| TokenError::Malformed {
            reason: "unexpected credential header".to_string(),
        })?;

    let blob = Base64UrlUnpadded::decode_vec(body).map_err(|e| TokenError::Malformed {
        reason: format!("invalid base64: {e}"),
    })?;

    if blob.len() <= ED25519_SIGNATURE_SIZE {
        return Err(TokenError::Malformed {
            reason: format!("credential too short: {} bytes", blob.len()),
        });
    }

    let (payload, sig_bytes) = blob.split_at(blob.len() - ED25519_SIGNATURE_SIZE);
    let sig_array: [u8; ED25519_SIGNATURE_SIZE] = sig_bytes
        .try_into()
        .map_err(|_| TokenError::IntegrityCheckFailed)?;
    let signature = Signature::from_bytes(&sig_array);

    key.verify(&signing_input(payload), &signature)
        .map_err(|_| TokenError::IntegrityCheckFailed)?;

    let claims: RefreshClaims = serde_json::from_slice(payload).map_err(|e| TokenError::Malformed {
        reason: format!("invalid claims: {e}"),
    })?;

    if claims.is_expired_at(now) {
        return Err(TokenError::Expired {
            expired_at: claims.exp,
        });
    }

    Ok(claims)
}
