// Post handlers
// HTTP handlers for post management operations

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::{info, warn};

use crate::{
    error::ApiError,
    models::post::{CreatePostRequest, UpdatePostRequest},
    AppState,
};

/// Create a new post
/// POST /api/posts
pub async fn create_post(
    State(state): State<AppState>,
    Json(request): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    info!("Creating new post with title: {}", request.title);

    let post = state.db.create_post(request).await?;

    info!("Successfully created post with id: {}", post.id);
    Ok((StatusCode::CREATED, Json(post)))
}

/// Get post by ID
/// GET /api/posts/:id
pub async fn get_post_by_id(
    State(state): State<AppState>,
    Path(post_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    info!("Fetching post with id: {}", post_id);

    let post = state.db.get_post_by_id(post_id).await?;

    Ok((StatusCode::OK, Json(post)))
}

/// Get all posts, newest first
/// GET /api/posts
pub async fn get_all_posts(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let posts = state.db.get_all_posts().await?;

    info!("Retrieved {} posts", posts.len());
    Ok((StatusCode::OK, Json(posts)))
}

/// Update title, description, status or categories
/// PUT /api/posts/:id
pub async fn update_post(
    State(state): State<AppState>,
    Path(post_id): Path<i32>,
    Json(request): Json<UpdatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    info!("Updating post with id: {}", post_id);

    let post = state.db.update_post(post_id, request).await?;

    Ok((StatusCode::OK, Json(post)))
}

/// Delete a post with everything attached to it, then its image files
/// DELETE /api/posts/:id
pub async fn delete_post(
    State(state): State<AppState>,
    Path(post_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    info!("Deleting post with id: {}", post_id);

    let image_paths = state.db.delete_post(post_id).await?;

    for path in &image_paths {
        if let Err(e) = state.media.remove(path).await {
            warn!("Failed to remove image file {}: {}", path, e);
        }
    }

    Ok(StatusCode::NO_CONTENT)
}
