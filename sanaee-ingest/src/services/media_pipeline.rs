//! Image ingestion pipeline
//!
//! Turns an untrusted user-selected file into a bounded inline image:
//! `data:image/jpeg;base64,...`, at most 400 px on the longer side.
//!
//! Checks run in order and stop at the first failure:
//! 1. Declared media type must start with `image/`
//! 2. Declared size must not exceed the input ceiling (no bytes read yet)
//! 3. Bytes must be readable
//! 4. Bytes must decode as an image
//!
//! Decode, resize and JPEG re-encode run on the blocking pool; the calling
//! task is suspended, never blocked. There is no built-in timeout.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use sanaee_common::config::MediaConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Prefix every safe embeddable image value starts with
pub const SAFE_EMBED_PREFIX: &str = "data:image/";

/// Prefix of values produced by [`MediaPipeline::compress`]
pub const JPEG_DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

/// Declared type used when sniffing cannot identify a file
pub const UNKNOWN_MEDIA_TYPE: &str = "application/octet-stream";

/// Media pipeline errors
///
/// All are user-correctable: pick another file and retry.
#[derive(Debug, Error)]
pub enum MediaError {
    /// Declared type is not an image type
    #[error("File is not an image (type: {declared_type})")]
    NotAnImage { declared_type: String },

    /// File exceeds the input ceiling
    #[error("Image is {:.1} MiB, the maximum is {:.1} MiB", mib(.size), mib(.max))]
    TooLarge { size: u64, max: u64 },

    /// File bytes could not be read
    #[error("Failed to read image: {0}")]
    Unreadable(String),

    /// Bytes are not a decodable image
    #[error("Image file is corrupted: {0}")]
    CorruptImage(String),
}

fn mib(bytes: &u64) -> f64 {
    *bytes as f64 / (1024.0 * 1024.0)
}

/// Where a [`MediaFile`]'s bytes live
#[derive(Debug, Clone)]
pub enum MediaSource {
    Bytes(Vec<u8>),
    Path(PathBuf),
}

/// A user-selected file: declared type and size plus a way to read it
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub name: String,
    /// Declared media type, e.g. `image/png`
    pub declared_type: String,
    /// Declared size in bytes
    pub size: u64,
    pub source: MediaSource,
}

impl MediaFile {
    /// In-memory file; size is the byte length
    pub fn from_bytes(name: impl Into<String>, declared_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
            size: bytes.len() as u64,
            source: MediaSource::Bytes(bytes),
        }
    }

    /// File on disk
    ///
    /// Size comes from filesystem metadata. The declared type is sniffed
    /// from the file's magic bytes, falling back to
    /// [`UNKNOWN_MEDIA_TYPE`].
    pub fn from_path(path: &Path) -> Result<Self, MediaError> {
        let metadata = std::fs::metadata(path)
            .map_err(|e| MediaError::Unreadable(format!("{}: {}", path.display(), e)))?;

        let declared_type = infer::get_from_path(path)
            .map_err(|e| MediaError::Unreadable(format!("{}: {}", path.display(), e)))?
            .map(|kind| kind.mime_type().to_string())
            .unwrap_or_else(|| UNKNOWN_MEDIA_TYPE.to_string());

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Ok(Self {
            name,
            declared_type,
            size: metadata.len(),
            source: MediaSource::Path(path.to_path_buf()),
        })
    }

    async fn read_bytes(&self) -> Result<Vec<u8>, MediaError> {
        match &self.source {
            MediaSource::Bytes(bytes) => Ok(bytes.clone()),
            MediaSource::Path(path) => tokio::fs::read(path)
                .await
                .map_err(|e| MediaError::Unreadable(format!("{}: {}", path.display(), e))),
        }
    }
}

/// Compressed inline image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// `data:image/jpeg;base64,...`
    pub data_url: String,
    pub width: u32,
    pub height: u32,
}

impl EncodedImage {
    pub fn as_str(&self) -> &str {
        &self.data_url
    }

    pub fn into_data_url(self) -> String {
        self.data_url
    }
}

/// Media pipeline service
#[derive(Debug, Clone)]
pub struct MediaPipeline {
    max_input_bytes: u64,
    max_dimension_px: u32,
    jpeg_quality: u8,
}

impl MediaPipeline {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            max_input_bytes: config.max_input_bytes,
            max_dimension_px: config.max_dimension_px,
            jpeg_quality: config.jpeg_quality,
        }
    }

    pub fn max_input_bytes(&self) -> u64 {
        self.max_input_bytes
    }

    /// Validate, decode, downsample and re-encode `file`
    pub async fn compress(&self, file: &MediaFile) -> Result<EncodedImage, MediaError> {
        if !file.declared_type.starts_with("image/") {
            return Err(MediaError::NotAnImage {
                declared_type: file.declared_type.clone(),
            });
        }

        if file.size > self.max_input_bytes {
            return Err(MediaError::TooLarge {
                size: file.size,
                max: self.max_input_bytes,
            });
        }

        let bytes = file.read_bytes().await?;

        // Declared size can lie for in-memory sources built by hand
        if bytes.len() as u64 > self.max_input_bytes {
            return Err(MediaError::TooLarge {
                size: bytes.len() as u64,
                max: self.max_input_bytes,
            });
        }

        let max_dimension = self.max_dimension_px;
        let quality = self.jpeg_quality;
        let encoded = tokio::task::spawn_blocking(move || reencode(&bytes, max_dimension, quality))
            .await
            .map_err(|e| MediaError::CorruptImage(format!("image worker failed: {}", e)))??;

        tracing::debug!(
            file = %file.name,
            input_bytes = file.size,
            width = encoded.width,
            height = encoded.height,
            output_bytes = encoded.data_url.len(),
            "Compressed image"
        );

        Ok(encoded)
    }
}

impl Default for MediaPipeline {
    fn default() -> Self {
        Self::new(&MediaConfig::default())
    }
}

/// Whether `value` may be embedded as an image source
///
/// Only `data:image/...` values pass. Applied at render time to stored
/// values too, since storage is untrusted on reload.
pub fn is_safe_embed_source(value: &str) -> bool {
    value.starts_with(SAFE_EMBED_PREFIX)
}

/// Scale `(width, height)` by one ratio so neither side exceeds `max`
///
/// The ratio never exceeds 1; both sides are rounded to the nearest
/// integer and kept at least 1.
pub fn target_dimensions(width: u32, height: u32, max: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width, height);
    }

    let max = max as f64;
    let ratio = (max / width as f64).min(max / height as f64).min(1.0);
    let scale = |side: u32| ((side as f64 * ratio).round() as u32).max(1);
    (scale(width), scale(height))
}

fn reencode(bytes: &[u8], max_dimension: u32, quality: u8) -> Result<EncodedImage, MediaError> {
    let decoded =
        image::load_from_memory(bytes).map_err(|e| MediaError::CorruptImage(e.to_string()))?;

    let (width, height) = target_dimensions(decoded.width(), decoded.height(), max_dimension);
    let resized = if (width, height) == (decoded.width(), decoded.height()) {
        decoded.to_rgb8()
    } else {
        decoded.resize_exact(width, height, FilterType::Triangle).to_rgb8()
    };

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, quality)
        .encode_image(&resized)
        .map_err(|e| MediaError::CorruptImage(format!("re-encode failed: {}", e)))?;

    Ok(EncodedImage {
        data_url: format!("{}{}", JPEG_DATA_URL_PREFIX, STANDARD.encode(&jpeg)),
        width,
        height,
    })
}
