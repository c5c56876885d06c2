//! Error handling for the SHELF HTTP layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use uuid::Uuid;

/// Application error types that map to HTTP responses
#[derive(Error, Debug)]
pub enum AppError {
    /// Rendered as a bare `text/plain` body, not the JSON envelope.
    #[error("{message}")]
    NotFound { message: String },

    #[error("bad request: {message}")]
    BadRequest { message: String, code: String },

    #[error("storage error: {message}")]
    Storage {
        details: Vec<serde_json::Value>,
        message: String,
    },
}

impl AppError {
    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            code: "bad_request".to_string(),
        }
    }

    /// Create a storage error carrying the raw store message
    pub fn storage(details: Vec<serde_json::Value>, message: impl Into<String>) -> Self {
        Self::Storage {
            details,
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            AppError::NotFound { message } => {
                tracing::debug!(status_code = 404, %message, "Request error");
                return (StatusCode::NOT_FOUND, message).into_response();
            }
            AppError::BadRequest { message, code } => {
                (StatusCode::BAD_REQUEST, code, message, Vec::new())
            }
            AppError::Storage { details, message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage_error".to_string(),
                message,
                details,
            ),
        };

        let error_id = Uuid::new_v4();
        let timestamp = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default();

        if status.is_server_error() {
            tracing::error!(
                error_id = %error_id,
                error_code = %error_code,
                status_code = %status.as_u16(),
                %message,
                "Request error"
            );
        } else {
            tracing::warn!(
                error_id = %error_id,
                error_code = %error_code,
                status_code = %status.as_u16(),
                "Request error"
            );
        }

        let error_response = json!({
            "error": {
                "code": error_code,
                "message": message,
                "details": details,
                "trace_id": error_id.to_string(),
                "timestamp": timestamp
            }
        });

        (status, Json(error_response)).into_response()
    }
}
