// Like handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::{
    error::ApiError,
    models::like::{CreateLikeRequest, LikeSummary, LikeTarget, LikeTargetKind},
    AppState,
};

/// Like a post (or any other likeable target)
/// POST /api/likes
pub async fn create_like(
    State(state): State<AppState>,
    Json(request): Json<CreateLikeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    info!("User {} liking {}", request.user_id, request.target);

    let like = state.db.create_like(request).await?;

    Ok((StatusCode::CREATED, Json(like)))
}

/// Query parameters selecting a like target
#[derive(Debug, Deserialize)]
pub struct LikeTargetQuery {
    pub kind: LikeTargetKind,
    pub id: i32,
}

/// Likes on one target, newest first
/// GET /api/likes?kind=post&id=<id>
pub async fn get_likes_for_target(
    State(state): State<AppState>,
    Query(query): Query<LikeTargetQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let target = LikeTarget::new(query.kind, query.id);

    let likes = state.db.get_likes_for_target(target).await?;

    info!("Retrieved {} likes for {}", likes.len(), target);
    Ok((StatusCode::OK, Json(likes)))
}

/// DELETE /api/likes/:id
pub async fn delete_like(
    State(state): State<AppState>,
    Path(like_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.delete_like(like_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Like count for a post, computed at request time
/// GET /api/posts/:id/likes
pub async fn get_post_likes(
    State(state): State<AppState>,
    Path(post_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let target = LikeTarget::Post(post_id);

    if !state.db.resolve_like_target(target).await? {
        return Err(ApiError::not_found(format!("Post with id {}", post_id)));
    }

    let total_likes = state.db.total_likes(target).await?;

    Ok((StatusCode::OK, Json(LikeSummary { target, total_likes })))
}
