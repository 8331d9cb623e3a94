//! Process-local key store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{KeyError, KeyStore};

/// Key store held in process memory.
///
/// Suitable for tests and single-instance development servers. Keys vanish
/// with the process, which invalidates every outstanding session.
#[derive(Debug, Default)]
pub struct InMemoryKeyStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyStore for InMemoryKeyStore {
    async fn get(&self, name: &str) -> Result<Option<Vec<u8>>, KeyError> {
        Ok(self.entries.read().await.get(name).cloned())
    }

    async fn set(&self, name: &str, value: &[u8]) -> Result<(), KeyError> {
        self.entries
            .write()
            .await
            .insert(name.to_string(), value.to_vec());
        Ok(())
    }

    async fn set_if_absent(&self, name: &str, value: &[u8]) -> Result<bool, KeyError> {
        let mut entries = self.entries.write().await;
        if entries.contains_key(name) {
            return Ok(false);
        }
        entries.insert(name.to_string(), value.to_vec());
        Ok(true)
    }
}
