//! Ingestion flow and directory views

pub mod directory;
pub mod preview;
pub mod queries;

pub use directory::{Directory, IngestPhase};
pub use preview::{ImagePreview, PreviewTicket, PreviewUpdate};
pub use queries::{
    avatar_for, directory_stats, distinct_areas, filter_workers, sanitize_phone, star_line,
    Avatar, DirectoryStats, WorkerFilter,
};
