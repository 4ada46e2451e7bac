use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use plato_core::error::{self, ApiError};

/// Internal error type that converts to structured API responses.
/// The `error` field of the wire envelope carries the user-facing message,
/// so chat clients can render it without branching on the code.
#[derive(Debug)]
pub enum AppError {
    /// Validation error (400)
    Validation {
        message: String,
        field: Option<String>,
    },
    /// No authenticated session (401)
    Unauthorized { message: String },
    /// Authenticated but wrong role (403)
    Forbidden { message: String },
    /// Daily assistant allowance consumed (429)
    QuotaExceeded { message: String },
    /// Feature disabled because a dependency is not configured (501)
    NotConfigured { message: String },
    /// Completion provider failed; its message is surfaced (500)
    Provider(String),
    /// Database error (500)
    Database(sqlx::Error),
    /// Internal error (500)
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let request_id = uuid::Uuid::now_v7().to_string();

        let (status, api_error) = match self {
            AppError::Validation { message, field } => (
                StatusCode::BAD_REQUEST,
                ApiError {
                    error: message,
                    code: error::codes::VALIDATION_FAILED.to_string(),
                    request_id,
                    field,
                },
            ),
            AppError::Unauthorized { message } => (
                StatusCode::UNAUTHORIZED,
                ApiError {
                    error: message,
                    code: error::codes::UNAUTHORIZED.to_string(),
                    request_id,
                    field: None,
                },
            ),
            AppError::Forbidden { message } => (
                StatusCode::FORBIDDEN,
                ApiError {
                    error: message,
                    code: error::codes::FORBIDDEN.to_string(),
                    request_id,
                    field: None,
                },
            ),
            AppError::QuotaExceeded { message } => (
                StatusCode::TOO_MANY_REQUESTS,
                ApiError {
                    error: message,
                    code: error::codes::QUOTA_EXCEEDED.to_string(),
                    request_id,
                    field: None,
                },
            ),
            AppError::NotConfigured { message } => (
                StatusCode::NOT_IMPLEMENTED,
                ApiError {
                    error: message,
                    code: error::codes::NOT_CONFIGURED.to_string(),
                    request_id,
                    field: None,
                },
            ),
            AppError::Provider(message) => {
                tracing::error!("Completion provider error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError {
                        error: message,
                        code: error::codes::PROVIDER_ERROR.to_string(),
                        request_id,
                        field: None,
                    },
                )
            }
            AppError::Database(err) => {
                tracing::error!("Database error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError {
                        error: "Error interno del servidor.".to_string(),
                        code: error::codes::INTERNAL_ERROR.to_string(),
                        request_id,
                        field: None,
                    },
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError {
                        error: "Error interno del servidor.".to_string(),
                        code: error::codes::INTERNAL_ERROR.to_string(),
                        request_id,
                        field: None,
                    },
                )
            }
        };

        (status, Json(api_error)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err)
    }
}
