use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use postgres_types::{FromSql, ToSql};

/// Kinds of entity that can be liked. Stored as the `like_target_kind` enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSql, FromSql)]
#[serde(rename_all = "lowercase")]
#[postgres(name = "like_target_kind")]
pub enum LikeTargetKind {
    #[postgres(name = "post")]
    Post,
}

impl LikeTargetKind {
    pub const ALL: [LikeTargetKind; 1] = [LikeTargetKind::Post];

    pub fn as_str(&self) -> &'static str {
        match self {
            LikeTargetKind::Post => "post",
        }
    }

    /// Table whose `id` column a target of this kind refers to.
    pub fn table(&self) -> &'static str {
        match self {
            LikeTargetKind::Post => "posts",
        }
    }
}

/// Reference to something a user liked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum LikeTarget {
    Post(i32),
}

impl LikeTarget {
    pub fn new(kind: LikeTargetKind, id: i32) -> Self {
        match kind {
            LikeTargetKind::Post => LikeTarget::Post(id),
        }
    }

    pub fn kind(&self) -> LikeTargetKind {
        match self {
            LikeTarget::Post(_) => LikeTargetKind::Post,
        }
    }

    pub fn id(&self) -> i32 {
        match self {
            LikeTarget::Post(id) => *id,
        }
    }
}

impl std::fmt::Display for LikeTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind().as_str(), self.id())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Like {
    pub id: i32,
    pub user_id: Uuid,
    pub target: LikeTarget,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateLikeRequest {
    pub user_id: Uuid,
    pub target: LikeTarget,
}

impl CreateLikeRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.user_id.is_nil() {
            return Err("User ID cannot be nil".to_string());
        }

        if self.target.id() <= 0 {
            return Err(format!("Invalid {} ID", self.target.kind().as_str()));
        }

        Ok(())
    }
}

/// Aggregated like count for one target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LikeSummary {
    pub target: LikeTarget,
    pub total_likes: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_round_trips_through_kind() {
        let target = LikeTarget::new(LikeTargetKind::Post, 9);

        assert_eq!(target, LikeTarget::Post(9));
        assert_eq!(target.kind(), LikeTargetKind::Post);
        assert_eq!(target.id(), 9);
        assert_eq!(target.to_string(), "post 9");
    }

    #[test]
    fn test_every_kind_has_a_lookup_table() {
        for kind in LikeTargetKind::ALL {
            assert!(!kind.table().is_empty());
        }
        assert_eq!(LikeTargetKind::Post.table(), "posts");
    }

    #[test]
    fn test_target_json_shape() {
        let json = serde_json::to_string(&LikeTarget::Post(4)).unwrap();
        assert_eq!(json, r#"{"kind":"post","id":4}"#);

        let parsed: LikeTarget = serde_json::from_str(r#"{"kind":"post","id":11}"#).unwrap();
        assert_eq!(parsed, LikeTarget::Post(11));

        assert!(serde_json::from_str::<LikeTarget>(r#"{"kind":"comment","id":1}"#).is_err());
    }

    #[test]
    fn test_create_like_request_validation() {
        let valid = CreateLikeRequest {
            user_id: Uuid::new_v4(),
            target: LikeTarget::Post(1),
        };
        assert!(valid.validate().is_ok());

        let nil_user = CreateLikeRequest {
            user_id: Uuid::nil(),
            target: LikeTarget::Post(1),
        };
        assert!(nil_user.validate().is_err());

        let bad_target = CreateLikeRequest {
            user_id: Uuid::new_v4(),
            target: LikeTarget::Post(0),
        };
        assert!(bad_target.validate().is_err());
    }
}
