//! Maps the portal error taxonomy onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use portal_core::PortalError;
use serde_json::json;
use tracing::error;

/// Wrapper giving [`PortalError`] an HTTP shape. Handlers return
/// `Result<_, ApiError>` and use `?` freely.
pub struct ApiError(pub PortalError);

impl From<PortalError> for ApiError {
    fn from(e: PortalError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self.0 {
            PortalError::Validation(fields) => (
                StatusCode::BAD_REQUEST,
                json!({ "errors": fields }),
            ),
            PortalError::Conflict(message) => {
                (StatusCode::CONFLICT, json!({ "error": message }))
            }
            PortalError::NotFound(message) => {
                (StatusCode::NOT_FOUND, json!({ "error": message }))
            }
            PortalError::Unauthorized(message) => {
                (StatusCode::UNAUTHORIZED, json!({ "error": message }))
            }
            PortalError::Notification(message) => {
                error!(error = %message, "Notification failure escaped to the HTTP layer");
                (StatusCode::BAD_GATEWAY, json!({ "error": message }))
            }
            PortalError::Dependency(message) => {
                error!(error = %message, "Dependency unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    json!({ "error": "Service temporarily unavailable. Please try again later." }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
