//! Image ingestion - normalizes an uploaded image before it is first stored
//!
//! Every upload is decoded, stretched to exactly 1020x573 (aspect ratio is
//! not preserved) and re-encoded as JPEG at quality 50, whatever the input
//! format was.
//!
//! Decoding and encoding are CPU-bound; async callers should go through
//! [`ingest_async`], which runs the work on the blocking thread pool.

use bytes::Bytes;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageOutputFormat};
use std::io::Cursor;
use thiserror::Error;
use tracing::debug;

use super::path::{split_filename, upload_image_path, ImagePath};

pub const TARGET_WIDTH: u32 = 1020;
pub const TARGET_HEIGHT: u32 = 573;
pub const JPEG_QUALITY: u8 = 50;
pub const CONTENT_TYPE: &str = "image/jpeg";

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Unable to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Unable to encode JPEG: {0}")]
    Encode(#[source] image::ImageError),

    #[error("Ingestion task failed: {0}")]
    Task(String),
}

/// A normalized upload, ready to be written to storage.
#[derive(Debug, Clone)]
pub struct StoredImage {
    /// JPEG bytes
    pub data: Bytes,
    pub path: ImagePath,
    /// `{original stem}.jpg`
    pub file_name: String,
    pub content_type: &'static str,
    pub size: usize,
    pub width: u32,
    pub height: u32,
}

impl StoredImage {
    /// Logical storage path relative to the media root.
    pub fn storage_path(&self) -> String {
        self.path.to_string()
    }

    /// Replace the storage path with a freshly drawn one, keeping the extension.
    pub fn reroll_path(&mut self) {
        self.path = ImagePath::random(self.path.extension.clone());
    }
}

/// Decode, resize and re-encode `raw` as a storage-ready JPEG.
///
/// `original_filename` only contributes the extension recorded in the
/// storage path; the content is never validated against it.
pub fn ingest(raw: &[u8], original_filename: &str) -> Result<StoredImage, IngestError> {
    let img = image::load_from_memory(raw).map_err(IngestError::Decode)?;

    let (orig_w, orig_h) = img.dimensions();
    debug!(
        original_width = orig_w,
        original_height = orig_h,
        "Ingesting uploaded image"
    );

    let resized = img.resize_exact(TARGET_WIDTH, TARGET_HEIGHT, FilterType::Triangle);
    let data = encode_jpeg(&resized)?;

    let (stem, _) = split_filename(original_filename);
    let path = upload_image_path(original_filename);

    debug!(
        path = %path,
        size = data.len(),
        "Image normalized"
    );

    Ok(StoredImage {
        size: data.len(),
        data,
        path,
        file_name: format!("{}.jpg", stem),
        content_type: CONTENT_TYPE,
        width: TARGET_WIDTH,
        height: TARGET_HEIGHT,
    })
}

/// Run [`ingest`] on tokio's blocking pool.
pub async fn ingest_async(raw: Bytes, original_filename: String) -> Result<StoredImage, IngestError> {
    tokio::task::spawn_blocking(move || ingest(&raw, &original_filename))
        .await
        .map_err(|e| IngestError::Task(e.to_string()))?
}

fn encode_jpeg(img: &DynamicImage) -> Result<Bytes, IngestError> {
    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());

    let mut buf = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Jpeg(JPEG_QUALITY))
        .map_err(IngestError::Encode)?;

    Ok(Bytes::from(buf))
}
