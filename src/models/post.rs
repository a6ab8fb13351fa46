use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use postgres_types::{FromSql, ToSql};

use super::like::LikeTarget;

pub const MAX_TITLE_LENGTH: usize = 250;

/// Publication state of a post. Stored as the `post_status` enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSql, FromSql)]
#[serde(rename_all = "lowercase")]
#[postgres(name = "post_status")]
pub enum PostStatus {
    #[default]
    #[postgres(name = "draft")]
    Draft,
    #[postgres(name = "published")]
    Published,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }
}

impl std::str::FromStr for PostStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "draft" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            other => Err(format!("Unknown post status '{}'", other)),
        }
    }
}

/// Blog post. `created_at` is assigned by the database on insert and never changes.
/// `total_likes` is counted fresh on every read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i32,
    pub title: String,
    pub author_id: Option<Uuid>,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub status: PostStatus,
    pub category_ids: Vec<i32>,
    pub total_likes: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub author_id: Option<Uuid>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: PostStatus,
    #[serde(default)]
    pub category_ids: Vec<i32>,
}

/// Partial update; `None` leaves a field untouched.
#[derive(Debug, Default, Deserialize)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<PostStatus>,
    pub category_ids: Option<Vec<i32>>,
}

impl Post {
    pub fn absolute_url(&self) -> String {
        format!("/api/posts/{}", self.id)
    }

    pub fn like_target(&self) -> LikeTarget {
        LikeTarget::Post(self.id)
    }
}

impl std::fmt::Display for Post {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.title)
    }
}

fn validate_title(title: &str) -> Result<(), String> {
    if title.trim().is_empty() {
        return Err("Title cannot be empty".to_string());
    }

    if title.trim().chars().count() > MAX_TITLE_LENGTH {
        return Err(format!("Title cannot exceed {} characters", MAX_TITLE_LENGTH));
    }

    Ok(())
}

fn validate_category_ids(ids: &[i32]) -> Result<(), String> {
    if ids.iter().any(|id| *id <= 0) {
        return Err("Category IDs must be positive".to_string());
    }
    Ok(())
}

fn normalize_category_ids(ids: &[i32]) -> Vec<i32> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

impl CreatePostRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_title(&self.title)?;
        validate_category_ids(&self.category_ids)?;
        Ok(())
    }

    pub fn get_normalized_title(&self) -> String {
        self.title.trim().to_string()
    }

    /// Sorted, without duplicates
    pub fn get_normalized_category_ids(&self) -> Vec<i32> {
        normalize_category_ids(&self.category_ids)
    }
}

impl UpdatePostRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.category_ids.is_none()
        {
            return Err("At least one field must be provided for update".to_string());
        }

        if let Some(ref title) = self.title {
            validate_title(title)?;
        }

        if let Some(ref ids) = self.category_ids {
            validate_category_ids(ids)?;
        }

        Ok(())
    }

    pub fn get_normalized_title(&self) -> Option<String> {
        self.title.as_ref().map(|t| t.trim().to_string())
    }

    pub fn get_normalized_category_ids(&self) -> Option<Vec<i32>> {
        self.category_ids.as_deref().map(normalize_category_ids)
    }

    /// True when the update touches a column of the `posts` row itself.
    pub fn has_row_changes(&self) -> bool {
        self.title.is_some() || self.description.is_some() || self.status.is_some()
    }
}
