//! Shared fixtures for sanaee-ingest integration tests

#![allow(dead_code)]

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{DynamicImage, ImageFormat, RgbImage};
use sanaee_common::config::TomlConfig;
use sanaee_ingest::db::MemoryByteStore;
use sanaee_ingest::services::media_pipeline::JPEG_DATA_URL_PREFIX;
use sanaee_ingest::validators::WorkerForm;
use sanaee_ingest::workflow::Directory;
use std::io::Cursor;
use std::sync::Arc;

pub const KEY: &str = "sanaee_workers_v1";
pub const MIB: usize = 1024 * 1024;

/// Encode a gradient image of the given size in `format`
pub fn image_bytes(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut cursor, format)
        .expect("encode test image");
    cursor.into_inner()
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    image_bytes(width, height, ImageFormat::Png)
}

/// Decode a `data:image/jpeg;base64,...` value back to an image
pub fn decode_data_url(value: &str) -> DynamicImage {
    let payload = value
        .strip_prefix(JPEG_DATA_URL_PREFIX)
        .expect("JPEG data URL prefix");
    let bytes = STANDARD.decode(payload).expect("valid base64");
    let format = image::guess_format(&bytes).expect("recognizable format");
    assert_eq!(format, ImageFormat::Jpeg);
    image::load_from_memory(&bytes).expect("decodable JPEG")
}

pub fn valid_form() -> WorkerForm {
    WorkerForm {
        name: "Ali Mahmoud".to_string(),
        specialty: "سباك".to_string(),
        area: "Tanta".to_string(),
        phone: "010-9999 9999".to_string(),
        rating: 4,
    }
}

/// Directory over a fresh in-memory store; returns the store handle too
pub async fn memory_directory(quota: u64) -> (Directory, MemoryByteStore) {
    let backend = MemoryByteStore::new(quota);
    let directory =
        sanaee_ingest::open_directory(Arc::new(backend.clone()), &TomlConfig::default()).await;
    (directory, backend)
}
