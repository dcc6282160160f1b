//! In-process byte store
//!
//! Same quota semantics as the SQLite backend, nothing survives the
//! process. Used for `--ephemeral` runs and as the test fixture store:
//! it counts writes and can be told to fail them.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{check_quota, entry_size, ByteStore, StoreError};

/// In-memory byte store
#[derive(Clone)]
pub struct MemoryByteStore {
    entries: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    quota_bytes: u64,
    writes: Arc<AtomicUsize>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryByteStore {
    pub fn new(quota_bytes: u64) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            quota_bytes,
            writes: Arc::new(AtomicUsize::new(0)),
            fail_writes: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Store pre-populated with one entry (bypasses the quota and the
    /// write counter)
    pub fn with_entry(quota_bytes: u64, key: &str, value: &[u8]) -> Self {
        let mut entries = HashMap::new();
        entries.insert(key.to_string(), value.to_vec());
        Self {
            entries: Arc::new(RwLock::new(entries)),
            ..Self::new(quota_bytes)
        }
    }

    /// Number of `set` calls that reached the backend, successful or not
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make every subsequent `set` fail with a backend error
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Raw bytes under `key`
    pub async fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.read().await.get(key).cloned()
    }
}

#[async_trait]
impl ByteStore for MemoryByteStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);

        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("writes disabled".to_string()));
        }

        let mut entries = self.entries.write().await;
        let others: u64 = entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| entry_size(k, v))
            .sum();
        check_quota(key, value, others, self.quota_bytes)?;

        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn quota_bytes(&self) -> u64 {
        self.quota_bytes
    }
}
