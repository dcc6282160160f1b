//! # Sanaee Common Library
//!
//! Shared code for the Sanaee worker directory:
//! - Worker record model and the fixed specialty set
//! - Configuration loading and root folder resolution
//! - Common error type
//! - Id utilities

pub mod config;
pub mod error;
pub mod models;
pub mod uuid_utils;

pub use error::{Error, Result};
pub use models::{NewWorker, Specialty, WorkerRecord};
