//! API error types and JSON error response formatting.
//!
//! Every failure is returned as `{"error": code, "message": text}` with a
//! matching HTTP status. Range errors add a `details` object naming the
//! offending value and the accepted bounds.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

use buddy_chat::ChatError;
use buddy_core::TravelError;
use buddy_places::PlacesError;

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g., "bad_request", "not_found").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - missing or invalid parameters.
    BadRequest(String),
    /// 404 Not Found - resource does not exist.
    NotFound(String),
    /// 422 Unprocessable Entity - valid syntax but out-of-range values.
    UnprocessableEntity(String),
    /// 422 with the value and bounds that were violated.
    OutOfRange {
        message: String,
        details: serde_json::Value,
    },
    /// 500 Internal Server Error - unexpected server error.
    Internal(String),
    /// 502 Bad Gateway - the place provider failed or answered badly.
    BadGateway(String),
    /// 503 Service Unavailable - provider quota reached or timed out.
    ServiceUnavailable(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::UnprocessableEntity(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "unprocessable_entity", msg, None)
            }
            ApiError::OutOfRange { message, details } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "unprocessable_entity",
                message,
                Some(details),
            ),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal API error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg, None)
            }
            ApiError::BadGateway(msg) => {
                tracing::warn!(error = %msg, "Place provider error");
                (StatusCode::BAD_GATEWAY, "upstream_error", msg, None)
            }
            ApiError::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", msg, None)
            }
        };

        let body = ErrorBody {
            error: error_code.to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::EmptyMessage | ChatError::MessageTooLong(_) | ChatError::ParseError(_) => {
                ApiError::BadRequest(err.to_string())
            }
            ChatError::SessionNotFound(_) => ApiError::NotFound(err.to_string()),
            ChatError::InvalidPreference(msg) => ApiError::UnprocessableEntity(msg),
            ChatError::StorageError(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<TravelError> for ApiError {
    fn from(err: TravelError) -> Self {
        match err {
            TravelError::RadiusOutOfBounds { value, min, max } => ApiError::OutOfRange {
                message: err.to_string(),
                details: json!({ "value": value, "min": min, "max": max }),
            },
            other => ApiError::from(ChatError::from(other)),
        }
    }
}

impl From<PlacesError> for ApiError {
    fn from(err: PlacesError) -> Self {
        match err {
            PlacesError::NotFound(_) => ApiError::NotFound(err.to_string()),
            PlacesError::InvalidRequest(_) | PlacesError::InvalidLocation(_) => {
                ApiError::BadRequest(err.to_string())
            }
            PlacesError::QuotaExceeded(_) | PlacesError::Timeout => {
                ApiError::ServiceUnavailable(err.to_string())
            }
            PlacesError::Auth(_)
            | PlacesError::Api { .. }
            | PlacesError::Transport(_)
            | PlacesError::Malformed(_)
            | PlacesError::Config(_) => ApiError::BadGateway(err.to_string()),
        }
    }
}
