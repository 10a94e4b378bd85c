pub mod health;
pub mod local;
pub mod wu;

pub use health::*;
pub use local::*;
pub use wu::*;

use axum::{http::StatusCode, Json};
use log::error;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::ingest;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

pub fn internal_error(message: impl Into<String>) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Logs the failure under the route it happened on and picks the status.
pub fn ingest_error(route: &str, err: ingest::Error) -> ApiError {
    error!("{} error: {}", route, err);
    match err {
        ingest::Error::InvalidRange(_) => bad_request(err.to_string()),
        _ => internal_error(err.to_string()),
    }
}

/// Treats a missing or blank query value the same way.
pub(crate) fn required(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}
