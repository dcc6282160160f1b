//! Error types for sanaee-ingest
//!
//! Every variant leaves the directory in an interactive, retryable state:
//! input and media errors are user-correctable, capacity errors are
//! retryable after freeing space. Storage corruption never surfaces here;
//! it is healed inside the persistence store.

use thiserror::Error;

use crate::services::MediaError;
use crate::validators::ValidationReport;

/// Ingestion flow error
#[derive(Debug, Error)]
pub enum IngestError {
    /// One or more form fields failed their rule
    #[error("Invalid input: {0}")]
    Validation(ValidationReport),

    /// The selected image was rejected by the media pipeline
    #[error(transparent)]
    Media(#[from] MediaError),

    /// The byte store is full; nothing was changed
    #[error("Storage is full ({needed} of {quota} bytes). Delete some workers or photos and retry")]
    CapacityExceeded { needed: u64, quota: u64 },

    /// Any other persistence failure; nothing was changed
    #[error("Failed to save workers: {0}")]
    Storage(String),

    /// sanaee-common error
    #[error("Common error: {0}")]
    Common(#[from] sanaee_common::Error),
}

impl From<crate::db::StoreError> for IngestError {
    fn from(err: crate::db::StoreError) -> Self {
        match err {
            crate::db::StoreError::QuotaExceeded { needed, quota } => {
                IngestError::CapacityExceeded { needed, quota }
            }
            crate::db::StoreError::Backend(msg) => IngestError::Storage(msg),
        }
    }
}

/// Result type for ingestion operations
pub type IngestResult<T> = Result<T, IngestError>;
