//! Configuration loading and root folder resolution
//!
//! Root folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. `SANAEE_ROOT_FOLDER` environment variable
//! 3. `root_folder` in the TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or unreadable TOML file never stops startup: defaults are used
//! and a warning is logged.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "SANAEE_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "sanaee.db";

/// Config file name looked up in the platform config directory
pub const CONFIG_FILE: &str = "sanaee.toml";

/// Default storage key holding the serialized worker collection
pub const DEFAULT_STORAGE_KEY: &str = "sanaee_workers_v1";

/// Default byte-store capacity (5 MiB, the usual browser local-storage budget)
pub const DEFAULT_STORAGE_QUOTA_BYTES: u64 = 5 * 1024 * 1024;

/// Default maximum accepted image file size (2 MiB)
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 2 * 1024 * 1024;

/// Default maximum pixel size of the longer image side after compression
pub const DEFAULT_MAX_IMAGE_PX: u32 = 400;

/// Default JPEG quality (0.8 on a 0-1 scale)
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Contents of `sanaee.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Root folder holding the database
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub media: MediaConfig,
}

/// `[logging]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// `[storage]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Key under which the whole collection is stored
    #[serde(default = "default_storage_key")]
    pub key: String,

    /// Capacity ceiling of the byte store (key + value bytes)
    #[serde(default = "default_quota_bytes")]
    pub quota_bytes: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            key: default_storage_key(),
            quota_bytes: default_quota_bytes(),
        }
    }
}

/// `[media]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Largest accepted input file, checked before decoding
    #[serde(default = "default_max_image_bytes")]
    pub max_input_bytes: u64,

    /// Longest side of the re-encoded image, in pixels
    #[serde(default = "default_max_image_px")]
    pub max_dimension_px: u32,

    /// JPEG quality, 1-100
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            max_input_bytes: default_max_image_bytes(),
            max_dimension_px: default_max_image_px(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

fn default_quota_bytes() -> u64 {
    DEFAULT_STORAGE_QUOTA_BYTES
}

fn default_max_image_bytes() -> u64 {
    DEFAULT_MAX_IMAGE_BYTES
}

fn default_max_image_px() -> u32 {
    DEFAULT_MAX_IMAGE_PX
}

fn default_jpeg_quality() -> u8 {
    DEFAULT_JPEG_QUALITY
}

impl TomlConfig {
    /// Validate value ranges that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.storage.key.trim().is_empty() {
            return Err(Error::Config("storage.key must not be empty".to_string()));
        }
        if self.storage.quota_bytes == 0 {
            return Err(Error::Config("storage.quota_bytes must be positive".to_string()));
        }
        if self.media.max_dimension_px == 0 {
            return Err(Error::Config("media.max_dimension_px must be positive".to_string()));
        }
        if !(1..=100).contains(&self.media.jpeg_quality) {
            return Err(Error::Config(format!(
                "media.jpeg_quality must be within 1-100, got {}",
                self.media.jpeg_quality
            )));
        }
        Ok(())
    }
}

/// Parse a TOML config file
pub fn read_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
    config.validate()?;
    Ok(config)
}

/// Where the effective config came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Parsed from this file
    File(PathBuf),
    /// No config file present
    Defaults,
    /// File present but unusable; defaults are in effect
    Fallback { path: PathBuf, reason: String },
}

impl ConfigSource {
    /// Report how the config was obtained
    ///
    /// Call after the tracing subscriber is installed.
    pub fn log(&self) {
        match self {
            ConfigSource::File(path) => info!("Loaded config: {}", path.display()),
            ConfigSource::Defaults => info!("No config file found, using defaults"),
            ConfigSource::Fallback { path, reason } => {
                warn!("Config {} unusable ({}), using defaults", path.display(), reason)
            }
        }
    }
}

/// Load config with graceful degradation, without logging
///
/// Uses `explicit` when given, otherwise the platform config file. Any
/// failure yields defaults and a [`ConfigSource::Fallback`].
pub fn resolve_toml_config(explicit: Option<&Path>) -> (TomlConfig, ConfigSource) {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => return (TomlConfig::default(), ConfigSource::Defaults),
        },
    };

    match read_toml_config(&path) {
        Ok(config) => (config, ConfigSource::File(path)),
        Err(e) => (
            TomlConfig::default(),
            ConfigSource::Fallback {
                path,
                reason: e.to_string(),
            },
        ),
    }
}

/// Load config with graceful degradation; fallbacks log a warning
pub fn load_toml_config(explicit: Option<&Path>) -> TomlConfig {
    let (config, source) = resolve_toml_config(explicit);
    source.log();
    config
}

/// Write a config file (used by `sanaee init-config`)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}

/// Platform config file path (`~/.config/sanaee/sanaee.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("sanaee").join(CONFIG_FILE))
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("sanaee"))
        .unwrap_or_else(|| PathBuf::from("./sanaee_data"))
}

/// Resolves the root folder from CLI, environment, TOML and defaults
pub struct RootFolderResolver<'a> {
    cli_arg: Option<PathBuf>,
    toml: Option<&'a TomlConfig>,
}

impl<'a> RootFolderResolver<'a> {
    pub fn new() -> Self {
        Self {
            cli_arg: None,
            toml: None,
        }
    }

    /// Highest-priority override from the command line
    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    pub fn with_toml(mut self, config: &'a TomlConfig) -> Self {
        self.toml = Some(config);
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }

        if let Some(path) = self.toml.and_then(|c| c.root_folder.clone()) {
            return path;
        }

        default_root_folder()
    }
}

impl Default for RootFolderResolver<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Creates the root folder and names the files inside it
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    /// Create the root folder if missing
    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            info!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }
}
