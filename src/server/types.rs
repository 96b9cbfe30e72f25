//! Request/response DTOs for the REST surface.
//!
//! Success responses wrap their payload as `{success: true, data: …}`;
//! failures use the common `{success: false, error, detail, traceback}`
//! shape regardless of which handler produced them.

use crate::error::WedcardError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

/// `{success: true, data: …}`
#[derive(Debug, Serialize)]
pub struct ApiSuccess<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiSuccess<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// `{success: false, error, detail, traceback}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub success: bool,
    /// Coarse category, e.g. "Validation Error".
    pub error: String,
    /// The top-level error message.
    pub detail: String,
    /// Rendered error source chain, outermost first.
    pub traceback: String,
}

/// An error plus the HTTP status it maps to.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ApiErrorBody,
}

impl From<WedcardError> for ApiError {
    fn from(err: WedcardError) -> Self {
        let (status, category) = classify(&err);
        ApiError {
            status,
            body: ApiErrorBody {
                success: false,
                error: category.to_string(),
                detail: err.to_string(),
                traceback: err.traceback(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Map a library error onto an HTTP status and a coarse category.
fn classify(err: &WedcardError) -> (StatusCode, &'static str) {
    use WedcardError::*;
    match err {
        MissingFields { .. } | UnsupportedImage { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "Validation Error")
        }
        ImageNotFound { .. } | UnknownTask { .. } => (StatusCode::NOT_FOUND, "Not Found"),
        ProviderNotConfigured { .. } | InvalidConfig(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "Configuration Error")
        }
        ProviderRejected { .. }
        | EmptyModelPayload { .. }
        | MalformedModelOutput { .. }
        | PageFailed(_) => (StatusCode::BAD_GATEWAY, "Upstream Error"),
        ProviderUnavailable { .. } => (StatusCode::SERVICE_UNAVAILABLE, "Upstream Error"),
        PollTimeout { .. } => (StatusCode::GATEWAY_TIMEOUT, "Upstream Error"),
        StorageFailed { .. } | Internal(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "Server Error")
        }
    }
}

/// Body of `POST /api/generate-3d`.
#[derive(Debug, Deserialize)]
pub struct Generate3dRequest {
    /// Path of a previously generated image on this server's disk.
    pub image_path: String,
}

/// Response of `POST /api/generate-3d`.
#[derive(Debug, Serialize)]
pub struct Generate3dResponse {
    pub task_id: String,
    /// Developer-facing echo of what was sent upstream (minus the image
    /// payload, which would dwarf the log).
    pub logs: serde_json::Value,
}
