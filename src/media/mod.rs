// Media module
// Image ingestion and on-disk storage for post images

pub mod ingest;
pub mod path;
pub mod storage;

pub use ingest::{ingest, ingest_async, IngestError, StoredImage, JPEG_QUALITY, TARGET_HEIGHT, TARGET_WIDTH};
pub use path::{upload_image_path, ImagePath};
pub use storage::MediaStorage;
