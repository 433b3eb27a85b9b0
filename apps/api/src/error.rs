use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use curanet_core::AppError;
use serde::Serialize;

/// API error payload.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'static str>,
}

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, error) = match self.0 {
            AppError::Validation(message) => (StatusCode::UNPROCESSABLE_ENTITY, message, None),
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, message, None),
            AppError::Conflict(message) => (StatusCode::CONFLICT, message, None),
            AppError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message, None),
            AppError::Forbidden(message) => (StatusCode::FORBIDDEN, message, None),
            AppError::Internal(detail) => {
                tracing::error!(%detail, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "an internal error occurred".to_owned(),
                    Some("internal_error"),
                )
            }
        };

        let payload = Json(ErrorResponse { message, error });

        (status, payload).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;
