// Library root for the blog posts API

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod media;
pub mod middleware;
pub mod models;

use std::sync::Arc;

// Re-export commonly used types
pub use db::Database;
pub use error::ApiError;
pub use media::{MediaStorage, StoredImage};
pub use models::{Comment, Like, LikeTarget, Post, PostImage, PostStatus};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub media: Arc<MediaStorage>,
    /// Public prefix for stored media, ends with `/`
    pub media_url: String,
}
