// User handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::info;
use uuid::Uuid;

use crate::{error::ApiError, models::user::CreateUserRequest, AppState};

/// Create a new user
/// POST /api/users
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    info!("Creating new user with username: {}", request.username);

    let user = state.db.create_user(request).await?;

    info!("Successfully created user with id: {}", user.id);
    Ok((StatusCode::CREATED, Json(user)))
}

/// Get user by ID
/// GET /api/users/:id
pub async fn get_user_by_id(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    info!("Fetching user with id: {}", user_id);

    let user = state.db.get_user_by_id(user_id).await?;

    Ok((StatusCode::OK, Json(user)))
}
