use axum::{
    extract::{Query, State},
    Json,
};
use log::error;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::IntoParams;

use crate::{
    routes::{internal_error, ApiError, ErrorResponse},
    AppState, StoredObservation,
};

pub const DEFAULT_LIMIT: u32 = 100;
pub const MAX_LIMIT: u32 = 1000;

#[derive(Clone, Debug, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LocalWeatherParams {
    /// Number of rows to return (default 100, max 1000)
    pub limit: Option<String>,
}

/// Non-numeric or empty input falls back to the default; negative values
/// clamp to zero.
pub fn effective_limit(raw: Option<&str>) -> u32 {
    let Some(value) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return DEFAULT_LIMIT;
    };
    match value.parse::<i64>() {
        Ok(limit) => limit.clamp(0, i64::from(MAX_LIMIT)) as u32,
        // too many digits for i64, still a number
        Err(_) if value.bytes().all(|b| b.is_ascii_digit()) => MAX_LIMIT,
        Err(_) => DEFAULT_LIMIT,
    }
}

#[utoipa::path(
    get,
    path = "/api/local/weather",
    params(LocalWeatherParams),
    responses(
        (status = OK, description = "Stored observations, newest local observation time first", body = Vec<StoredObservation>),
        (status = INTERNAL_SERVER_ERROR, description = "Storage failure", body = ErrorResponse)
    ))]
pub async fn local_weather(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LocalWeatherParams>,
) -> Result<Json<Vec<StoredObservation>>, ApiError> {
    let limit = effective_limit(params.limit.as_deref());

    state
        .store
        .latest_observations(limit)
        .await
        .map(Json)
        .map_err(|e| {
            error!("/api/local/weather error: {}", e);
            internal_error(e.to_string())
        })
}
