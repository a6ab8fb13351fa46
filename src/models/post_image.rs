use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// Image attached to a post. `image_path` is relative to the media root and
/// never changes after creation; the bytes behind it are always the
/// normalized JPEG produced by ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostImage {
    pub id: i32,
    pub post_id: i32,
    pub image_path: String,
    pub content_type: String,
    pub size: i64,
    pub width: i32,
    pub height: i32,
    pub created_at: DateTime<Utc>,
}

/// Metadata-only update. Image bytes and path cannot be changed here.
#[derive(Debug, Deserialize)]
pub struct UpdatePostImageRequest {
    pub post_id: i32,
}

/// `PostImage` as returned over HTTP, with its public URL.
#[derive(Debug, Clone, Serialize)]
pub struct PostImageResponse {
    #[serde(flatten)]
    pub image: PostImage,
    pub url: String,
}

impl PostImage {
    /// Public URL under the configured media prefix (which ends in `/`).
    pub fn absolute_url(&self, media_url: &str) -> String {
        format!("{}{}", media_url, self.image_path)
    }

    pub fn into_response(self, media_url: &str) -> PostImageResponse {
        let url = self.absolute_url(media_url);
        PostImageResponse { image: self, url }
    }
}

impl UpdatePostImageRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.post_id <= 0 {
            return Err("Post ID must be positive".to_string());
        }
        Ok(())
    }
}
