use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

pub const MAX_BODY_LENGTH: usize = 10_000;

/// Comment left on a post. Both references are nullable; `created` is set
/// by the database on insert and never changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i32,
    pub post_id: Option<i32>,
    pub user_id: Option<Uuid>,
    pub body: String,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub user_id: Option<Uuid>,
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub body: String,
}

fn validate_body(body: &str) -> Result<(), String> {
    if body.trim().is_empty() {
        return Err("Comment body cannot be empty".to_string());
    }

    if body.len() > MAX_BODY_LENGTH {
        return Err(format!("Comment body cannot exceed {} characters", MAX_BODY_LENGTH));
    }

    Ok(())
}

impl CreateCommentRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_body(&self.body)
    }

    pub fn get_normalized_body(&self) -> String {
        self.body.trim().to_string()
    }
}

impl UpdateCommentRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_body(&self.body)
    }

    pub fn get_normalized_body(&self) -> String {
        self.body.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_comment_request_validation() {
        let valid = CreateCommentRequest {
            user_id: None,
            body: "Nice photos!".to_string(),
        };
        assert!(valid.validate().is_ok());

        let blank = CreateCommentRequest {
            user_id: Some(Uuid::new_v4()),
            body: " \n ".to_string(),
        };
        assert!(blank.validate().is_err());

        let long = CreateCommentRequest {
            user_id: None,
            body: "a".repeat(MAX_BODY_LENGTH + 1),
        };
        assert!(long.validate().is_err());
    }

    #[test]
    fn test_update_comment_request_normalization() {
        let request = UpdateCommentRequest { body: "  edited  ".to_string() };
        assert!(request.validate().is_ok());
        assert_eq!(request.get_normalized_body(), "edited");
    }

    #[test]
    fn test_comment_deserialization() {
        let json = r#"{"id":5,"post_id":null,"user_id":null,"body":"orphan","created":"2023-05-01T12:00:00Z"}"#;
        let comment: Comment = serde_json::from_str(json).expect("Failed to deserialize comment");

        assert_eq!(comment.post_id, None);
        assert_eq!(comment.user_id, None);
        assert_eq!(comment.body, "orphan");
    }
}
