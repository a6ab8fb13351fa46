// Comment handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::info;

use crate::{
    error::ApiError,
    models::comment::{CreateCommentRequest, UpdateCommentRequest},
    AppState,
};

/// Comment on a post
/// POST /api/posts/:id/comments
pub async fn create_comment(
    State(state): State<AppState>,
    Path(post_id): Path<i32>,
    Json(request): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.get_post_by_id(post_id).await?;

    let comment = state.db.create_comment(Some(post_id), request).await?;

    info!("Created comment {} on post {}", comment.id, post_id);
    Ok((StatusCode::CREATED, Json(comment)))
}

/// Comments for a post, newest first
/// GET /api/posts/:id/comments
pub async fn get_comments_for_post(
    State(state): State<AppState>,
    Path(post_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.get_post_by_id(post_id).await?;

    let comments = state.db.get_comments_for_post(post_id).await?;

    Ok((StatusCode::OK, Json(comments)))
}

/// GET /api/comments
pub async fn get_all_comments(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let comments = state.db.get_all_comments().await?;

    Ok((StatusCode::OK, Json(comments)))
}

/// GET /api/comments/:id
pub async fn get_comment_by_id(
    State(state): State<AppState>,
    Path(comment_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let comment = state.db.get_comment_by_id(comment_id).await?;

    Ok((StatusCode::OK, Json(comment)))
}

/// PUT /api/comments/:id
pub async fn update_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<i32>,
    Json(request): Json<UpdateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let comment = state.db.update_comment(comment_id, request).await?;

    Ok((StatusCode::OK, Json(comment)))
}

/// DELETE /api/comments/:id
pub async fn delete_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.delete_comment(comment_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
