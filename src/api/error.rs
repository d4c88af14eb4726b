use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// JSON error body: `{"message": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

/// Errors returned from request handlers and middleware.
#[derive(Debug)]
pub enum ApiError {
    Store(StoreError),
    /// Request body could not be decoded.
    BadRequest(String),
    Unauthorized(&'static str),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Store(StoreError::InvalidArgument(msg)) => {
                tracing::warn!("Validation error: {}", msg);
                (StatusCode::BAD_REQUEST, msg)
            }
            Self::Store(e @ StoreError::NotFound { .. }) => {
                tracing::debug!("{}", e);
                (StatusCode::NOT_FOUND, "Note not found".to_string())
            }
            // Full details stay in the server log.
            Self::Store(e @ StoreError::StorageUnavailable(_)) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            Self::BadRequest(msg) => {
                tracing::warn!("Rejected request body: {}", msg);
                (StatusCode::BAD_REQUEST, msg)
            }
            Self::Unauthorized(msg) => {
                tracing::warn!("{}", msg);
                (StatusCode::UNAUTHORIZED, msg.to_string())
            }
        };

        (status, Json(ErrorBody { message })).into_response()
    }
}
