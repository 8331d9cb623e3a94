//! SQL-backed key store.
//!
//! Uses sqlx with `AnyPool` so the same code serves SQLite (single host) and
//! PostgreSQL (shared by every server replica). Values are stored as base64
//! text, which keeps the schema portable between the two dialects.
//!
//! `set_if_absent` is a single conditional insert, so concurrent startups of
//! several replicas cannot both win the same key name.

use async_trait::async_trait;
use base64ct::{Base64, Encoding};
use sqlx::AnyPool;
use sqlx::any::AnyPoolOptions;

use super::{KeyError, KeyStore};

/// Extension trait for sqlx Result types to simplify error handling.
pub(crate) trait SqlxResultExt<T> {
    /// Convert sqlx error to `KeyError::Sql` with context message.
    fn sql_context(self, context: &str) -> Result<T, KeyError>;
}

impl<T> SqlxResultExt<T> for std::result::Result<T, sqlx::Error> {
    fn sql_context(self, context: &str) -> Result<T, KeyError> {
        self.map_err(|e| KeyError::Sql {
            reason: format!("{context}: {e}"),
            source: Some(e),
        })
    }
}

/// Database kind for SQL dialect selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbKind {
    Sqlite,
    Postgres,
}

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS tessera_keys (
    name TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL
)";

/// Key store persisted in a SQL database.
pub struct SqlKeyStore {
    pool: AnyPool,
    kind: DbKind,
}

impl std::fmt::Debug for SqlKeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlKeyStore")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl SqlKeyStore {
    /// Get the database kind.
    pub fn kind(&self) -> DbKind {
        self.kind
    }

    pub fn is_sqlite(&self) -> bool {
        self.kind == DbKind::Sqlite
    }

    async fn initialize(pool: AnyPool, kind: DbKind) -> Result<Self, KeyError> {
        sqlx::query(CREATE_TABLE)
            .execute(&pool)
            .await
            .sql_context("Failed to create key table")?;
        Ok(Self { pool, kind })
    }
}

#[cfg(feature = "sqlite")]
impl SqlKeyStore {
    /// Open a SQLite database at the given path, creating it if needed.
    pub async fn open_sqlite<P: AsRef<std::path::Path>>(path: P) -> Result<Self, KeyError> {
        // mode=rwc: read-write-create (create file if it doesn't exist)
        let url = format!("sqlite:{}?mode=rwc", path.as_ref().display());
        Self::connect_sqlite(&url).await
    }

    /// Connect to a SQLite database using a connection URL.
    pub async fn connect_sqlite(url: &str) -> Result<Self, KeyError> {
        sqlx::any::install_default_drivers();

        let pool = AnyPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .sql_context("Failed to connect to SQLite")?;

        // busy_timeout: several processes may open the same file at startup
        sqlx::query("PRAGMA busy_timeout = 5000;")
            .execute(&pool)
            .await
            .sql_context("Failed to configure SQLite")?;

        Self::initialize(pool, DbKind::Sqlite).await
    }
}

#[cfg(feature = "postgres")]
impl SqlKeyStore {
    /// Connect to a PostgreSQL database using a connection URL.
    pub async fn connect_postgres(url: &str) -> Result<Self, KeyError> {
        sqlx::any::install_default_drivers();

        let pool = AnyPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await
            .sql_context("Failed to connect to PostgreSQL")?;

        Self::initialize(pool, DbKind::Postgres).await
    }
}

fn decode_value(name: &str, text: &str) -> Result<Vec<u8>, KeyError> {
    Base64::decode_vec(text).map_err(|e| KeyError::Malformed {
        name: name.to_string(),
        reason: format!("Invalid base64 in key store: {e}"),
    })
}

#[async_trait]
impl KeyStore for SqlKeyStore {
    async fn get(&self, name: &str) -> Result<Option<Vec<u8>>, KeyError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM tessera_keys WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .sql_context("Failed to read key")?;

        row.map(|(text,)| decode_value(name, &text)).transpose()
    }

    async fn set(&self, name: &str, value: &[u8]) -> Result<(), KeyError> {
        let encoded = Base64::encode_string(value);
        let sql = if self.is_sqlite() {
            "INSERT OR REPLACE INTO tessera_keys (name, value) VALUES ($1, $2)"
        } else {
            "INSERT INTO tessera_keys (name, value) VALUES ($1, $2)
             ON CONFLICT (name) DO UPDATE SET value = EXCLUDED.value"
        };

        sqlx::query(sql)
            .bind(name)
            .bind(encoded)
            .execute(&self.pool)
            .await
            .sql_context("Failed to store key")?;

        Ok(())
    }

    async fn set_if_absent(&self, name: &str, value: &[u8]) -> Result<bool, KeyError> {
        let encoded = Base64::encode_string(value);
        let sql = if self.is_sqlite() {
            "INSERT OR IGNORE INTO tessera_keys (name, value) VALUES ($1, $2)"
        } else {
            "INSERT INTO tessera_keys (name, value) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING"
        };

        let result = sqlx::query(sql)
            .bind(name)
            .bind(encoded)
            .execute(&self.pool)
            .await
            .sql_context("Failed to insert key")?;

        Ok(result.rows_affected() == 1)
    }
}
