//! Key-value byte store access
//!
//! The worker collection lives under a single key in a capacity-bounded
//! byte store. [`ByteStore`] is the seam; [`SqliteByteStore`] is the
//! durable backend and [`MemoryByteStore`] the in-process one.

pub mod kv_store;
pub mod memory;

pub use kv_store::SqliteByteStore;
pub use memory::MemoryByteStore;

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;
use thiserror::Error;

/// Byte store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Write rejected because key + value would exceed the quota
    #[error("Storage quota exceeded: {needed} bytes needed, quota is {quota} bytes")]
    QuotaExceeded { needed: u64, quota: u64 },

    /// Any other backend failure
    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Capacity-bounded key-value byte store
#[async_trait]
pub trait ByteStore: Send + Sync {
    /// Read the value under `key`, `None` if absent
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Overwrite the value under `key`
    ///
    /// Fails with [`StoreError::QuotaExceeded`] without touching the prior
    /// value when the write would not fit.
    async fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Capacity ceiling in bytes
    fn quota_bytes(&self) -> u64;
}

/// Bytes a single entry occupies against the quota
pub fn entry_size(key: &str, value: &[u8]) -> u64 {
    (key.len() + value.len()) as u64
}

/// Reject a write that would not fit in `quota`
///
/// `other_entries` is the footprint of every entry except `key`.
pub fn check_quota(key: &str, value: &[u8], other_entries: u64, quota: u64) -> Result<(), StoreError> {
    let needed = other_entries + entry_size(key, value);
    if needed > quota {
        return Err(StoreError::QuotaExceeded { needed, quota });
    }
    Ok(())
}

/// Initialize the SQLite connection pool and the `kv_store` table
pub async fn init_database_pool(db_path: &Path) -> sanaee_common::Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // mode=rwc: read, write, create
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&db_url)
        .await?;

    if newly_created {
        tracing::info!("Initialized new database: {}", db_path.display());
    } else {
        tracing::info!("Opened existing database: {}", db_path.display());
    }

    init_tables(&pool).await?;

    Ok(pool)
}

/// Create the `kv_store` table if it does not exist
pub async fn init_tables(pool: &SqlitePool) -> sanaee_common::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS kv_store (
            key TEXT PRIMARY KEY,
            value BLOB NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::debug!("Database tables initialized (kv_store)");

    Ok(())
}
