//! JSON error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use cuentas_core::LedgerError;
use cuentas_shared::AppError;

/// Error returned by every handler.
///
/// Serializes as `{"error": CODE, "message": ..., "field": ..., "retryable": ...}`
/// with the status taken from the wrapped [`AppError`].
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(code = err.error_code(), error = %err, "request failed");
        } else {
            tracing::debug!(code = err.error_code(), error = %err, "request rejected");
        }

        let body = json!({
            "error": err.error_code(),
            "message": err.to_string(),
            "field": err.field(),
            "retryable": err.is_retryable(),
        });
        (status, Json(body)).into_response()
    }
}

/// Handler result alias.
pub type ApiResult<T> = Result<T, ApiError>;
