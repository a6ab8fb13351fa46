// Post image handlers
// Upload goes through ingestion exactly once; later edits only touch metadata

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use tracing::info;

use crate::{
    error::ApiError,
    media,
    models::post_image::{PostImageResponse, UpdatePostImageRequest},
    AppState,
};

/// Multipart field carrying the image
pub const IMAGE_FIELD: &str = "image";

/// Pull the first `image` field out of a multipart body.
async fn read_image_field(multipart: &mut Multipart) -> Result<(String, Bytes), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::constraint(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::constraint(format!("Failed to read upload: {}", e)))?;

        return Ok((file_name, data));
    }

    Err(ApiError::constraint(format!("Missing '{}' field", IMAGE_FIELD)))
}

/// Upload an image for a post
/// POST /api/posts/:id/images (multipart/form-data, field `image`)
pub async fn upload_post_image(
    State(state): State<AppState>,
    Path(post_id): Path<i32>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let (file_name, data) = read_image_field(&mut multipart).await?;
    info!("Received {} ({} bytes) for post {}", file_name, data.len(), post_id);

    // Reject before spending CPU on the image
    state.db.get_post_by_id(post_id).await?;

    let stored = media::ingest_async(data, file_name).await?;
    info!("Ingested upload as {} ({} bytes)", stored.file_name, stored.size);
    let image = state.db.create_post_image(post_id, stored, &state.media).await?;

    Ok((StatusCode::CREATED, Json(image.into_response(&state.media_url))))
}

/// GET /api/posts/:id/images
pub async fn get_images_for_post(
    State(state): State<AppState>,
    Path(post_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.get_post_by_id(post_id).await?;

    let images: Vec<PostImageResponse> = state
        .db
        .get_images_for_post(post_id)
        .await?
        .into_iter()
        .map(|image| image.into_response(&state.media_url))
        .collect();

    Ok((StatusCode::OK, Json(images)))
}

/// GET /api/images/:id
pub async fn get_post_image_by_id(
    State(state): State<AppState>,
    Path(image_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let image = state.db.get_post_image_by_id(image_id).await?;

    Ok((StatusCode::OK, Json(image.into_response(&state.media_url))))
}

/// Reassign an image to another post without re-processing it
/// PUT /api/images/:id
pub async fn update_post_image(
    State(state): State<AppState>,
    Path(image_id): Path<i32>,
    Json(request): Json<UpdatePostImageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    info!("Updating post image {} metadata", image_id);

    let image = state.db.update_post_image(image_id, request).await?;

    Ok((StatusCode::OK, Json(image.into_response(&state.media_url))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_upload_is_a_decode_error() {
        let err = media::ingest_async(Bytes::new(), "empty.png".to_string())
            .await
            .map_err(ApiError::from)
            .unwrap_err();

        assert!(matches!(err, ApiError::Decode(_)));
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
