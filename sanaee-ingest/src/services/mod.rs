//! Services for the Sanaee ingestion core

pub mod media_pipeline;
pub mod persistence_store;

pub use media_pipeline::{
    is_safe_embed_source, EncodedImage, MediaError, MediaFile, MediaPipeline, MediaSource,
};
pub use persistence_store::WorkerStore;
