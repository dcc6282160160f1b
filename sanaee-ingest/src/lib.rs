//! sanaee-ingest library interface
//!
//! Persistence and media-ingestion core of the Sanaee worker directory:
//! - `services::media_pipeline`: untrusted image file → bounded inline JPEG
//! - `services::persistence_store`: whole-collection load/save over a
//!   capacity-bounded byte store, with corruption recovery
//! - `validators`: declarative form rules
//! - `workflow`: the add/delete ingestion flow and read-only views

pub mod db;
pub mod error;
pub mod services;
pub mod validators;
pub mod workflow;

pub use crate::error::{IngestError, IngestResult};

use sanaee_common::config::TomlConfig;
use std::sync::Arc;

use crate::db::ByteStore;
use crate::services::{MediaPipeline, WorkerStore};
use crate::workflow::Directory;

/// Open a [`Directory`] over `backend` using the storage and media
/// settings from `config`
pub async fn open_directory(backend: Arc<dyn ByteStore>, config: &TomlConfig) -> Directory {
    let store = WorkerStore::new(backend, config.storage.key.clone());
    let media = MediaPipeline::new(&config.media);
    Directory::open(store, media).await
}
