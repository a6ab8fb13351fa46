// Handlers module
// HTTP handlers for the REST API

pub mod categories;
pub mod comments;
pub mod images;
pub mod likes;
pub mod posts;
pub mod users;

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use tracing::warn;

use crate::AppState;

/// Health check handler
/// Returns "OK" when the database answers, 503 otherwise
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.health_check().await {
        Ok(()) => (StatusCode::OK, "OK"),
        Err(e) => {
            warn!("Health check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE")
        }
    }
}
