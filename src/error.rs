use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tokio_postgres::error::SqlState;

use crate::media::IngestError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Constraint error: {0}")]
    Constraint(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn constraint(message: impl Into<String>) -> Self {
        Self::Constraint(message.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound(resource.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// HTTP status and stable machine-readable code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Decode(_) => (StatusCode::UNPROCESSABLE_ENTITY, "DECODE_ERROR"),
            ApiError::Storage(err) if err.contains("unavailable") => {
                (StatusCode::SERVICE_UNAVAILABLE, "STORAGE_ERROR")
            }
            ApiError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
            ApiError::Constraint(_) => (StatusCode::BAD_REQUEST, "CONSTRAINT_ERROR"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();

        let message = match self {
            ApiError::Decode(ref message) => {
                tracing::debug!("Rejected undecodable image: {}", message);
                message.clone()
            }
            ApiError::Storage(ref err) => {
                if err.contains("timeout") {
                    tracing::warn!("Storage operation timeout: {}", err);
                } else {
                    tracing::error!("Storage error: {}", err);
                }

                // Internal details stay in the logs
                if err.contains("timeout") {
                    "Storage operation timed out, please try again".to_string()
                } else if err.contains("unavailable") {
                    "Storage service is temporarily unavailable".to_string()
                } else {
                    "A storage error occurred".to_string()
                }
            }
            ApiError::Constraint(ref message) => {
                tracing::debug!("Constraint violation: {}", message);
                message.clone()
            }
            ApiError::NotFound(ref resource) => {
                tracing::debug!("Resource not found: {}", resource);
                format!("{} not found", resource)
            }
            ApiError::Conflict(ref message) => {
                tracing::debug!("Conflict: {}", message);
                message.clone()
            }
            ApiError::Internal(ref err) => {
                tracing::error!("Internal server error: {:#}", err);
                "An internal server error occurred".to_string()
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

impl From<tokio_postgres::Error> for ApiError {
    fn from(err: tokio_postgres::Error) -> Self {
        match err.code() {
            Some(&SqlState::UNIQUE_VIOLATION) => {
                let message = if err.to_string().contains("username") {
                    "Username already exists".to_string()
                } else if err.to_string().contains("categories") {
                    "Category already exists".to_string()
                } else {
                    "Resource already exists".to_string()
                };
                ApiError::Conflict(message)
            }
            Some(&SqlState::FOREIGN_KEY_VIOLATION) => {
                ApiError::Constraint("Referenced resource does not exist".to_string())
            }
            Some(&SqlState::NOT_NULL_VIOLATION) => {
                let message = if err.to_string().contains("title") {
                    "Required field 'title' is missing".to_string()
                } else if err.to_string().contains("post_id") {
                    "Required field 'post' is missing".to_string()
                } else {
                    "Required field is missing".to_string()
                };
                ApiError::Constraint(message)
            }
            Some(&SqlState::CHECK_VIOLATION) => {
                ApiError::Constraint("Data validation constraint violated".to_string())
            }
            Some(&SqlState::INVALID_TEXT_REPRESENTATION) => {
                ApiError::Constraint("Invalid data format provided".to_string())
            }
            Some(&SqlState::STRING_DATA_RIGHT_TRUNCATION) => {
                ApiError::Constraint("Text data exceeds maximum length".to_string())
            }
            Some(&SqlState::CONNECTION_EXCEPTION)
            | Some(&SqlState::CONNECTION_DOES_NOT_EXIST)
            | Some(&SqlState::CONNECTION_FAILURE) => {
                tracing::error!("PostgreSQL connection error: {}", err);
                ApiError::Storage("Database connection unavailable".to_string())
            }
            _ => {
                tracing::error!("Unhandled PostgreSQL error: {} (code: {:?})", err, err.code());
                ApiError::Storage("Database operation failed".to_string())
            }
        }
    }
}

impl From<deadpool_postgres::PoolError> for ApiError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        match err {
            deadpool_postgres::PoolError::Timeout(_) => {
                tracing::warn!("Database connection pool timeout: {}", err);
                ApiError::Storage("Database connection timeout".to_string())
            }
            deadpool_postgres::PoolError::Closed => {
                tracing::error!("Database connection pool is closed: {}", err);
                ApiError::Storage("Database service unavailable".to_string())
            }
            deadpool_postgres::PoolError::NoRuntimeSpecified => {
                tracing::error!("Database pool runtime error: {}", err);
                ApiError::Internal(anyhow::anyhow!("Database configuration error"))
            }
            _ => {
                tracing::error!("Database connection pool error: {}", err);
                ApiError::Storage("Database connection unavailable".to_string())
            }
        }
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Decode(_) => ApiError::Decode(err.to_string()),
            IngestError::Encode(_) | IngestError::Task(_) => {
                ApiError::Internal(anyhow::Error::new(err))
            }
        }
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        tracing::error!("Media storage I/O error: {}", err);
        ApiError::Storage(format!("Media write failed: {}", err))
    }
}
