use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

/// Account that authors posts, writes comments and likes content.
/// Accounts are managed elsewhere; this is the minimal record the blog references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
}

impl User {
    pub fn new(username: String) -> Self {
        User {
            id: Uuid::new_v4(),
            username,
            created_at: Utc::now(),
        }
    }
}

impl std::fmt::Display for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.username)
    }
}

impl CreateUserRequest {
    pub fn validate(&self) -> Result<(), String> {
        let username = self.username.trim();

        if username.is_empty() {
            return Err("Username cannot be empty".to_string());
        }

        if username.len() > 150 {
            return Err("Username cannot exceed 150 characters".to_string());
        }

        if !username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
        {
            return Err("Username may only contain letters, digits and @/./+/-/_".to_string());
        }

        Ok(())
    }

    pub fn into_user(self) -> User {
        User::new(self.username.trim().to_string())
    }
}
