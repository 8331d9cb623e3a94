//! Key material for credential encryption and signing.
//!
//! Three entries live in a [`KeyStore`]:
//!
//! * `localKey` - 32-byte AES-256-GCM key sealing access credentials
//! * `refreshPrivateKey` - 32-byte Ed25519 seed signing refresh credentials
//! * `refreshPublicKey` - 32-byte Ed25519 key verifying refresh credentials
//!
//! All three are generated once by [`ensure_keys`] at process start and are
//! never mutated afterwards. Losing them invalidates every outstanding session.
//!
//! Readers go through a [`KeyRing`], which reads the store on every token
//! operation so replicas sharing a store always agree on the keys in use.

mod errors;
mod in_memory;
#[cfg(any(feature = "sqlite", feature = "postgres"))]
mod sql;

use std::sync::Arc;

use async_trait::async_trait;
use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::RngCore;
use rand::rngs::OsRng;
use zeroize::Zeroizing;

pub use errors::KeyError;
pub use in_memory::InMemoryKeyStore;
#[cfg(any(feature = "sqlite", feature = "postgres"))]
pub use sql::{DbKind, SqlKeyStore};

use crate::constants::{LOCAL_KEY, REFRESH_PRIVATE_KEY, REFRESH_PUBLIC_KEY};

/// Size of the symmetric access-credential key in bytes.
pub const LOCAL_KEY_SIZE: usize = 32;

/// Size of Ed25519 private and public keys in bytes.
pub const ED25519_KEY_SIZE: usize = 32;

/// Durable key/value store for key material.
///
/// Implementations must be reachable by every server instance that needs to
/// validate the same credentials.
#[async_trait]
pub trait KeyStore: Send + Sync + std::fmt::Debug {
    /// Read an entry, `None` when absent.
    async fn get(&self, name: &str) -> Result<Option<Vec<u8>>, KeyError>;

    /// Unconditionally write an entry.
    async fn set(&self, name: &str, value: &[u8]) -> Result<(), KeyError>;

    /// Write an entry only if no entry with that name exists.
    ///
    /// Returns `true` when this call created the entry. Must be atomic with
    /// respect to other writers of the same store.
    async fn set_if_absent(&self, name: &str, value: &[u8]) -> Result<bool, KeyError>;
}

/// Symmetric key for access credentials. Zeroed on drop.
#[derive(Clone)]
pub struct LocalKey(Zeroizing<[u8; LOCAL_KEY_SIZE]>);

impl LocalKey {
    /// Generate a fresh random key.
    pub fn generate() -> Self {
        let mut bytes = Zeroizing::new([0u8; LOCAL_KEY_SIZE]);
        OsRng.fill_bytes(&mut bytes[..]);
        Self(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let array: [u8; LOCAL_KEY_SIZE] = bytes.try_into().map_err(|_| KeyError::Malformed {
            name: LOCAL_KEY.to_string(),
            reason: format!("expected {LOCAL_KEY_SIZE} bytes, got {}", bytes.len()),
        })?;
        Ok(Self(Zeroizing::new(array)))
    }

    pub fn as_bytes(&self) -> &[u8; LOCAL_KEY_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for LocalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("LocalKey([REDACTED])")
    }
}

fn signing_key_from_bytes(bytes: &[u8]) -> Result<SigningKey, KeyError> {
    let seed = Zeroizing::new(<[u8; ED25519_KEY_SIZE]>::try_from(bytes).map_err(|_| {
        KeyError::Malformed {
            name: REFRESH_PRIVATE_KEY.to_string(),
            reason: format!("expected {ED25519_KEY_SIZE} bytes, got {}", bytes.len()),
        }
    })?);
    Ok(SigningKey::from_bytes(&seed))
}

fn verifying_key_from_bytes(bytes: &[u8]) -> Result<VerifyingKey, KeyError> {
    let array: [u8; ED25519_KEY_SIZE] = bytes.try_into().map_err(|_| KeyError::Malformed {
        name: REFRESH_PUBLIC_KEY.to_string(),
        reason: format!("expected {ED25519_KEY_SIZE} bytes, got {}", bytes.len()),
    })?;
    VerifyingKey::from_bytes(&array).map_err(|e| KeyError::Malformed {
        name: REFRESH_PUBLIC_KEY.to_string(),
        reason: e.to_string(),
    })
}

/// Typed access to the keys held in a [`KeyStore`].
#[derive(Clone, Debug)]
pub struct KeyRing {
    store: Arc<dyn KeyStore>,
}

impl KeyRing {
    pub fn new(store: Arc<dyn KeyStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn KeyStore> {
        &self.store
    }

    async fn require(&self, name: &str) -> Result<Zeroizing<Vec<u8>>, KeyError> {
        self.store
            .get(name)
            .await?
            .map(Zeroizing::new)
            .ok_or_else(|| KeyError::Missing {
                name: name.to_string(),
            })
    }

    /// Key sealing access credentials.
    pub async fn local_key(&self) -> Result<LocalKey, KeyError> {
        LocalKey::from_bytes(&self.require(LOCAL_KEY).await?)
    }

    /// Key signing refresh credentials.
    pub async fn refresh_signing_key(&self) -> Result<SigningKey, KeyError> {
        signing_key_from_bytes(&self.require(REFRESH_PRIVATE_KEY).await?)
    }

    /// Key verifying refresh credentials.
    pub async fn refresh_verifying_key(&self) -> Result<VerifyingKey, KeyError> {
        verifying_key_from_bytes(&self.require(REFRESH_PUBLIC_KEY).await?)
    }
}

/// What [`ensure_keys`] did on this startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyInitReport {
    pub generated_local_key: bool,
    pub generated_refresh_pair: bool,
}

/// Make sure all three keys exist, generating any that are missing.
///
/// Idempotent and safe to run concurrently from several processes sharing a
/// store: every write is a conditional insert, and the public key is always
/// derived from whichever private key won the race, so replicas cannot end up
/// with a split key pair.
///
/// Any error here is fatal; callers must not serve requests without keys.
pub async fn ensure_keys(store: &dyn KeyStore) -> Result<KeyInitReport, KeyError> {
    let mut report = KeyInitReport::default();

    let candidate = LocalKey::generate();
    if store.set_if_absent(LOCAL_KEY, candidate.as_bytes()).await? {
        report.generated_local_key = true;
        tracing::info!("Generated new {LOCAL_KEY} for access credentials");
    }

    let candidate = SigningKey::generate(&mut OsRng);
    if store
        .set_if_absent(REFRESH_PRIVATE_KEY, candidate.to_bytes().as_ref())
        .await?
    {
        report.generated_refresh_pair = true;
        tracing::info!("Generated new {REFRESH_PRIVATE_KEY} for refresh credentials");
    }

    // Re-read: another process may have won the private key insert.
    let stored_private = store
        .get(REFRESH_PRIVATE_KEY)
        .await?
        .map(Zeroizing::new)
        .ok_or_else(|| KeyError::Missing {
            name: REFRESH_PRIVATE_KEY.to_string(),
        })?;
    let expected_public = signing_key_from_bytes(&stored_private)?.verifying_key();

    store
        .set_if_absent(REFRESH_PUBLIC_KEY, expected_public.as_bytes())
        .await?;

    let stored_public = store
        .get(REFRESH_PUBLIC_KEY)
        .await?
        .ok_or_else(|| KeyError::Missing {
            name: REFRESH_PUBLIC_KEY.to_string(),
        })?;
    if verifying_key_from_bytes(&stored_public)? != expected_public {
        return Err(KeyError::PairMismatch);
    }

    // The local key must also parse, otherwise every request would fail later.
    let local = store.get(LOCAL_KEY).await?.map(Zeroizing::new).ok_or_else(|| {
        KeyError::Missing {
            name: LOCAL_KEY.to_string(),
        }
    })?;
    LocalKey::from_bytes(&local)?;

    tracing::info!(
        generated_local_key = report.generated_local_key,
        generated_refresh_pair = report.generated_refresh_pair,
        "Credential keys initialized"
    );
    Ok(report)
}
