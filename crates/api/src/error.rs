//! HTTP rendering of application errors.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use kindred_core::media::ErrorEnvelope;
use kindred_shared::AppError;

/// Application error rendered as the `{success:false, message}` envelope.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    /// 401 with `message`.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self(AppError::Unauthorized(message.into()))
    }

    /// 400 for a missing or unreadable field.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self(AppError::MalformedInput(message.into()))
    }

    /// 500 carrying a generic provider message.
    pub fn provider(message: impl Into<String>) -> Self {
        Self(AppError::Provider(message.into()))
    }

    /// HTTP status of the error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.0.error_code(), error = %self.0, "Request failed");
        } else {
            tracing::debug!(code = self.0.error_code(), error = %self.0, "Request rejected");
        }
        (status, Json(ErrorEnvelope::new(self.0.public_message()))).into_response()
    }
}
