//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::ValidationError;
use intake::IntakeError;
use store::StoreError;

/// API-level error type that maps to HTTP responses.
///
/// Every response body is the uniform `{"error": message}` envelope;
/// internal failures are logged with their cause and answered with a
/// generic message.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Order payload validation failure.
    Validation(ValidationError),
    /// Internal server error; the string is logged, not returned.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            ApiError::Internal(cause) => {
                tracing::error!(error = %cause, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<IntakeError> for ApiError {
    fn from(err: IntakeError) -> Self {
        match err {
            IntakeError::Validation(err) => ApiError::Validation(err),
            IntakeError::NotFound(_) => ApiError::NotFound("Order not found".to_string()),
            IntakeError::Store(err) => ApiError::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intake_not_found_maps_without_leaking_the_id() {
        let err = ApiError::from(IntakeError::NotFound(common::OrderId::new()));
        assert!(matches!(err, ApiError::NotFound(msg) if msg == "Order not found"));
    }

    #[test]
    fn store_errors_become_internal() {
        let err = ApiError::from(StoreError::Corrupt("bad row".to_string()));
        assert!(matches!(err, ApiError::Internal(_)));
    }
}
