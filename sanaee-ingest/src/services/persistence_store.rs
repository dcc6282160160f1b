//! Worker collection persistence
//!
//! The whole collection is one JSON array under one key. `load` is
//! read-or-default: an absent, empty or corrupt blob is replaced by the
//! seed roster (one write) and a fresh copy of the roster is returned.
//! `save` overwrites the blob (last write wins) and reports failure as a
//! boolean; nothing here is fatal to the caller.

use sanaee_common::models::default_roster;
use sanaee_common::WorkerRecord;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::db::{ByteStore, StoreError};

/// Persistence store for the worker collection
#[derive(Clone)]
pub struct WorkerStore {
    store: Arc<dyn ByteStore>,
    key: String,
}

impl WorkerStore {
    pub fn new(store: Arc<dyn ByteStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the collection, seeding defaults on first run or corruption
    ///
    /// Side effect: writes the default roster when the stored blob is
    /// absent, empty, or not an array of worker records.
    pub async fn load(&self) -> Vec<WorkerRecord> {
        let bytes = match self.store.get(&self.key).await {
            Ok(bytes) => bytes,
            Err(e) => {
                // Unreadable store: serve defaults without overwriting
                warn!(key = %self.key, error = %e, "Worker store unreadable, using defaults");
                return default_roster();
            }
        };

        let bytes = match bytes {
            Some(bytes) if !bytes.is_empty() => bytes,
            _ => {
                info!(key = %self.key, "No stored workers, seeding defaults");
                return self.seed_defaults().await;
            }
        };

        match serde_json::from_slice::<Vec<WorkerRecord>>(&bytes) {
            Ok(records) => {
                let records = dedupe_ids(records);
                debug!(key = %self.key, count = records.len(), "Loaded workers");
                records
            }
            Err(e) => {
                warn!(
                    key = %self.key,
                    error = %e,
                    "Stored workers are corrupted, resetting to defaults"
                );
                self.seed_defaults().await
            }
        }
    }

    /// Overwrite the stored collection; `false` on any failure
    pub async fn save(&self, records: &[WorkerRecord]) -> bool {
        match self.try_save(records).await {
            Ok(()) => true,
            Err(StoreError::QuotaExceeded { needed, quota }) => {
                warn!(
                    key = %self.key,
                    needed,
                    quota,
                    "Storage full, workers not saved"
                );
                false
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to save workers");
                false
            }
        }
    }

    /// Overwrite the stored collection, returning the typed failure
    pub async fn try_save(&self, records: &[WorkerRecord]) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(records)
            .map_err(|e| StoreError::Backend(format!("Serialize workers failed: {}", e)))?;
        self.store.set(&self.key, &bytes).await?;
        debug!(key = %self.key, count = records.len(), bytes = bytes.len(), "Saved workers");
        Ok(())
    }

    async fn seed_defaults(&self) -> Vec<WorkerRecord> {
        let defaults = default_roster();
        self.save(&defaults).await;
        default_roster()
    }
}

// Ids must be unique; stored data is untrusted, so keep the first
// occurrence of each id.
fn dedupe_ids(records: Vec<WorkerRecord>) -> Vec<WorkerRecord> {
    let total = records.len();
    let mut seen = HashSet::with_capacity(total);
    let unique: Vec<WorkerRecord> = records
        .into_iter()
        .filter(|r| seen.insert(r.id.clone()))
        .collect();

    if unique.len() != total {
        warn!(dropped = total - unique.len(), "Dropped workers with duplicate ids");
    }
    unique
}
