//! Identity lookup collaborator.
//!
//! Relational storage of account records lives outside this crate; the
//! session layer only needs the narrow [`UserDirectory`] interface. An
//! in-process implementation backs tests and single-node deployments.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::crypto::hash_password;
use super::errors::UserError;
use super::types::{Identity, NewUser, Role, UserRecord};

/// Read-through access to account records.
///
/// Every call must reflect the current state of the source of truth; the
/// session layer never caches results across requests.
#[async_trait]
pub trait UserDirectory: Send + Sync + std::fmt::Debug {
    /// Look up an identity by id.
    async fn find_by_id(&self, id: i64) -> Result<Option<Identity>, UserError>;

    /// Look up an identity and its password hash by username.
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, UserError>;

    /// Create an account. Fails if the username is taken.
    async fn create_user(&self, user: NewUser) -> Result<Identity, UserError>;

    /// Replace the stored password hash. Returns `false` if no such id.
    async fn set_password_hash(&self, id: i64, password_hash: String) -> Result<bool, UserError>;
}

#[derive(Debug, Default)]
struct Records {
    next_id: i64,
    by_id: BTreeMap<i64, UserRecord>,
}

/// In-process [`UserDirectory`].
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    records: RwLock<Records>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash `password` and create an account.
    pub async fn insert(
        &self,
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<Identity, UserError> {
        let password_hash = hash_password(password)?;
        self.create_user(NewUser {
            username: username.to_string(),
            password_hash,
            role,
        })
        .await
    }

    /// Lock or unlock an account. Returns `false` if no such id.
    pub async fn set_locked(&self, id: i64, locked: bool) -> bool {
        let mut records = self.records.write().await;
        match records.by_id.get_mut(&id) {
            Some(record) => {
                record.identity.is_locked = locked;
                true
            }
            None => false,
        }
    }

    /// Change an account's role. Returns `false` if no such id.
    pub async fn set_role(&self, id: i64, role: Role) -> bool {
        let mut records = self.records.write().await;
        match records.by_id.get_mut(&id) {
            Some(record) => {
                record.identity.role = role;
                true
            }
            None => false,
        }
    }

    /// Delete an account. Returns `false` if no such id.
    pub async fn remove(&self, id: i64) -> bool {
        self.records.write().await.by_id.remove(&id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.by_id.is_empty()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_id(&self, id: i64) -> Result<Option<Identity>, UserError> {
        Ok(self
            .records
            .read()
            .await
            .by_id
            .get(&id)
            .map(|r| r.identity.clone()))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, UserError> {
        Ok(self
            .records
            .read()
            .await
            .by_id
            .values()
            .find(|r| r.identity.username == username)
            .cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<Identity, UserError> {
        let mut records = self.records.write().await;
        if records
            .by_id
            .values()
            .any(|r| r.identity.username == user.username)
        {
            return Err(UserError::UsernameAlreadyExists {
                username: user.username,
            });
        }

        records.next_id += 1;
        let identity = Identity {
            id: records.next_id,
            username: user.username,
            role: user.role,
            avatar: None,
            is_locked: false,
        };
        records.by_id.insert(
            identity.id,
            UserRecord {
                identity: identity.clone(),
                password_hash: user.password_hash,
            },
        );
        Ok(identity)
    }

    async fn set_password_hash(&self, id: i64, password_hash: String) -> Result<bool, UserError> {
        let mut records = self.records.write().await;
        Ok(match records.by_id.get_mut(&id) {
            Some(record) => {
                record.password_hash = password_hash;
                true
            }
            None => false,
        })
    }
}

/// Outcome of [`seed_admin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedOutcome {
    Created(Identity),
    Skipped,
}

/// Create an admin account named `username` unless one already exists.
pub async fn seed_admin(
    directory: &dyn UserDirectory,
    username: &str,
    password: &str,
) -> Result<SeedOutcome, UserError> {
    if directory.find_by_username(username).await?.is_some() {
        tracing::info!(username, "Admin account already exists, skipping seed");
        return Ok(SeedOutcome::Skipped);
    }

    let created = directory
        .create_user(NewUser {
            username: username.to_string(),
            password_hash: hash_password(password)?,
            role: Role::Admin,
        })
        .await;

    match created {
        Ok(identity) => {
            tracing::info!(username, id = identity.id, "Created admin account");
            Ok(SeedOutcome::Created(identity))
        }
        // Lost a race with a concurrent seed
        Err(UserError::UsernameAlreadyExists { .. }) => Ok(SeedOutcome::Skipped),
        Err(e) => Err(e),
    }
}
