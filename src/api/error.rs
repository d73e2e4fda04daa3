//! Pipeline-error to HTTP-response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::error::FetchError;

/// Wrapper so handlers can `?` pipeline errors straight into a JSON
/// error response.
///
/// Upstream rejections pass through with their own status (401, 404);
/// transport and parse failures surface as 502 because this service is
/// the caller's gateway, except timeouts which map to 504. A tripped
/// breaker or a missing fallback store is 503 since the condition
/// clears on its own.
#[derive(Debug)]
pub struct ApiError(pub FetchError);

impl From<FetchError> for ApiError {
    fn from(e: FetchError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            FetchError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            FetchError::Unauthorized => StatusCode::UNAUTHORIZED,
            FetchError::NotFound => StatusCode::NOT_FOUND,
            FetchError::Network(msg) if msg.contains("timed out") => StatusCode::GATEWAY_TIMEOUT,
            FetchError::Network(_) | FetchError::Parse(_) => StatusCode::BAD_GATEWAY,
            FetchError::CircuitOpen | FetchError::FallbackUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
