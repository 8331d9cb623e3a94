//! Key store creation and utility functions.

use std::path::PathBuf;
use std::sync::Arc;

use tessera::keys::{InMemoryKeyStore, KeyStore, SqlKeyStore};

use crate::cli::{KeyStoreKind, ServeArgs};

const SQLITE_FILE: &str = "tessera-keys.db";

/// Redact credentials from a PostgreSQL connection URL for safe logging
pub fn redact_postgres_url(url: &str) -> String {
    if let Ok(parsed) = url::Url::parse(url) {
        let mut redacted = parsed.clone();
        if !parsed.username().is_empty() {
            let _ = redacted.set_username("***");
        }
        if parsed.password().is_some() {
            let _ = redacted.set_password(Some("***"));
        }
        redacted.to_string()
    } else {
        "postgres://***@<unparsable-url>".to_string()
    }
}

/// Create the key store selected on the command line
pub async fn create_key_store(
    args: &ServeArgs,
) -> Result<Arc<dyn KeyStore>, Box<dyn std::error::Error>> {
    match args.keystore {
        KeyStoreKind::Sqlite => {
            let data_dir = args.data_dir.clone().unwrap_or_else(|| PathBuf::from("."));
            tokio::fs::create_dir_all(&data_dir).await?;

            let db_path = data_dir.join(SQLITE_FILE);
            tracing::info!("Using SQLite key store at {}", db_path.display());
            Ok(Arc::new(SqlKeyStore::open_sqlite(&db_path).await?))
        }
        KeyStoreKind::Postgres => {
            let url = args
                .postgres_url
                .as_ref()
                .ok_or("PostgreSQL key store requires --postgres-url or TESSERA_POSTGRES_URL")?;

            let display_url = redact_postgres_url(url);
            tracing::info!("Connecting to PostgreSQL key store at {}", display_url);

            match SqlKeyStore::connect_postgres(url).await {
                Ok(store) => {
                    tracing::info!("Connected to PostgreSQL successfully");
                    Ok(Arc::new(store))
                }
                Err(e) => {
                    Err(format!("Failed to connect to PostgreSQL at {display_url}: {e}").into())
                }
            }
        }
        KeyStoreKind::Inmemory => {
            tracing::warn!("Using in-memory key store; sessions will not survive a restart");
            Ok(Arc::new(InMemoryKeyStore::new()))
        }
    }
}
