use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tracing::info;

use crate::{error::ApiError, models::category::CreateCategoryRequest, AppState};

/// POST /api/categories
pub async fn create_category(
    State(state): State<AppState>,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    info!("Creating category: {}", request.name);

    let category = state.db.create_category(request).await?;

    Ok((StatusCode::CREATED, Json(category)))
}

/// GET /api/categories
pub async fn get_all_categories(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let categories = state.db.get_all_categories().await?;

    Ok((StatusCode::OK, Json(categories)))
}
