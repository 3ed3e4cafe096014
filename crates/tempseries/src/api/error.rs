//! Mapping from service errors to HTTP responses.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use crate::error::Error;

/// Message used for every 404.
pub const NOT_FOUND_MESSAGE: &str = "Temperature record not found";

/// An error response: `{ "success": false, "message": ..., "error"?: ... }`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>, error: Option<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                success: false,
                message: message.into(),
                error,
            },
        }
    }

    /// Map a service error. `context` is the message used for server faults.
    ///
    /// Client faults become 400 with the error's own message, missing
    /// records become 404, and everything else is logged and becomes 500.
    #[must_use]
    pub fn from_service(context: &'static str, err: Error) -> Self {
        if err.is_client_error() {
            Self::new(StatusCode::BAD_REQUEST, err.to_string(), None)
        } else if err.is_not_found() {
            Self::not_found()
        } else {
            error!(error = %err, "{context}");
            Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                context,
                Some(err.to_string()),
            )
        }
    }

    /// The standard 404 response.
    #[must_use]
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE, None)
    }

    /// HTTP status of this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Human-readable message of this error.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.body.message
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "Invalid JSON body",
            Some(rejection.body_text()),
        )
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "Invalid query parameters",
            Some(rejection.body_text()),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
