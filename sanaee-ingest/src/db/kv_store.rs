//! SQLite-backed byte store
//!
//! One row per key in `kv_store`. The quota covers every row, measured in
//! bytes of key plus value, and is checked in the same transaction as the
//! write so a rejected write leaves the prior value intact.

use async_trait::async_trait;
use sqlx::SqlitePool;

use super::{check_quota, ByteStore, StoreError};

/// Durable byte store over the shared SQLite pool
#[derive(Clone)]
pub struct SqliteByteStore {
    pool: SqlitePool,
    quota_bytes: u64,
}

impl SqliteByteStore {
    /// Wrap a pool whose `kv_store` table already exists
    /// (see [`super::init_database_pool`])
    pub fn new(pool: SqlitePool, quota_bytes: u64) -> Self {
        Self { pool, quota_bytes }
    }

    /// Bytes currently used by every entry
    pub async fn used_bytes(&self) -> Result<u64, StoreError> {
        let used: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(LENGTH(CAST(key AS BLOB)) + LENGTH(value)), 0) FROM kv_store",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(used.max(0) as u64)
    }
}

#[async_trait]
impl ByteStore for SqliteByteStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let row: Option<(Vec<u8>,)> = sqlx::query_as("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(value,)| value))
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let others: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(LENGTH(CAST(key AS BLOB)) + LENGTH(value)), 0)
             FROM kv_store WHERE key != ?",
        )
        .bind(key)
        .fetch_one(&mut *tx)
        .await?;

        // Dropping tx rolls back, leaving the prior value untouched
        check_quota(key, value, others.max(0) as u64, self.quota_bytes)?;

        sqlx::query(
            "INSERT INTO kv_store (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(key, bytes = value.len(), "Stored value");
        Ok(())
    }

    fn quota_bytes(&self) -> u64 {
        self.quota_bytes
    }
}
