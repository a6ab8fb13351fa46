//! Storage path generation for uploaded post images.
//!
//! Every image lands at `post_images/{n}/{n}.{ext}` where `n` is drawn
//! uniformly from `[1, 3_999_999_999]`. Paths are not checked for collisions
//! here; the `post_images.image_path` UNIQUE constraint catches them.

use rand::Rng;
use std::fmt;
use std::path::Path;

pub const UPLOAD_DIR: &str = "post_images";
pub const MIN_IMAGE_ID: u64 = 1;
pub const MAX_IMAGE_ID: u64 = 3_999_999_999;

/// Extension used when the uploaded filename carries none, or one unsafe for a URL.
pub const FALLBACK_EXTENSION: &str = "jpg";

/// Longest extension kept from an uploaded filename.
pub const MAX_EXTENSION_LEN: usize = 10;

/// A generated storage location for one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePath {
    pub id: u64,
    pub extension: String,
}

impl ImagePath {
    pub fn new(id: u64, extension: impl Into<String>) -> Self {
        ImagePath {
            id,
            extension: extension.into(),
        }
    }

    /// Draw a fresh random id for the given extension.
    pub fn random(extension: impl Into<String>) -> Self {
        let id = rand::thread_rng().gen_range(MIN_IMAGE_ID..=MAX_IMAGE_ID);
        Self::new(id, extension)
    }

    /// Directory the file lives in, relative to the media root.
    pub fn directory(&self) -> String {
        format!("{}/{}", UPLOAD_DIR, self.id)
    }

    pub fn file_name(&self) -> String {
        format!("{}.{}", self.id, self.extension)
    }
}

impl fmt::Display for ImagePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.directory(), self.file_name())
    }
}

/// Split a filename into its stem and extension (without the dot).
pub fn split_filename(filename: &str) -> (String, Option<String>) {
    let path = Path::new(filename);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .filter(|e| !e.is_empty());
    (stem, extension)
}

/// Extensions end up in file names and public URLs, so only short ASCII alphanumerics pass.
fn is_safe_extension(extension: &str) -> bool {
    extension.len() <= MAX_EXTENSION_LEN && extension.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Generate a storage path for an upload named `filename`.
pub fn upload_image_path(filename: &str) -> ImagePath {
    let (_, extension) = split_filename(filename);
    let extension = extension
        .filter(|ext| is_safe_extension(ext))
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_string());
    ImagePath::random(extension)
}
