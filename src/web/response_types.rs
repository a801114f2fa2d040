//! # Web API Error Types
//!
//! Error types specific to the import API and their HTTP response
//! conversions, using thiserror and Axum's IntoResponse.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::error::GeoflowError;

/// Import API errors with HTTP status code mappings.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Resource not found")]
    NotFound,

    #[error("Invalid request: {message}")]
    BadRequest { message: String },

    #[error("Storage operation failed: {operation}")]
    StorageError { operation: String },

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    /// Create a BadRequest error with a custom message
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Create a StorageError with operation context
    pub fn storage_error(operation: impl Into<String>) -> Self {
        Self::StorageError {
            operation: operation.into(),
        }
    }
}

impl From<GeoflowError> for ApiError {
    fn from(error: GeoflowError) -> Self {
        match error {
            GeoflowError::Database { operation, .. } => Self::StorageError { operation },
            GeoflowError::Validation { message } => Self::BadRequest { message },
            _ => Self::Internal,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::StorageError { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
