use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use utoipa::IntoParams;

use crate::{
    routes::{bad_request, ingest_error, required, ApiError, ErrorResponse},
    AppState, RangeHistory,
};

#[derive(Clone, Debug, Default, Serialize, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct HistoryParams {
    /// PWS station identifier, e.g. IALFAR32
    pub station_id: Option<String>,
    /// Day to fetch, YYYYMMDD
    pub date: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct RangeParams {
    /// PWS station identifier, e.g. IALFAR32
    pub station_id: Option<String>,
    /// First day of the range, YYYYMMDD
    pub start: Option<String>,
    /// Last day of the range (inclusive), YYYYMMDD
    pub end: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/wu/history",
    params(HistoryParams),
    responses(
        (status = OK, description = "Raw WU history payload, after its observations were stored"),
        (status = BAD_REQUEST, description = "Missing stationId or date", body = ErrorResponse),
        (status = INTERNAL_SERVER_ERROR, description = "Upstream or storage failure", body = ErrorResponse)
    ))]
pub async fn history(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Value>, ApiError> {
    let (Some(station_id), Some(date)) = (required(&params.station_id), required(&params.date))
    else {
        return Err(bad_request("Missing parameters stationId or date"));
    };

    state
        .ingest
        .ingest_day(station_id, date)
        .await
        .map(Json)
        .map_err(|e| ingest_error("/api/wu/history", e))
}

#[utoipa::path(
    get,
    path = "/api/wu/history/range",
    params(RangeParams),
    responses(
        (status = OK, description = "Observations of every day in the range, in date order", body = RangeHistory),
        (status = BAD_REQUEST, description = "Missing parameters or invalid date range", body = ErrorResponse),
        (status = INTERNAL_SERVER_ERROR, description = "A day failed upstream or in storage", body = ErrorResponse)
    ))]
pub async fn history_range(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RangeParams>,
) -> Result<Json<RangeHistory>, ApiError> {
    let (Some(station_id), Some(start), Some(end)) = (
        required(&params.station_id),
        required(&params.start),
        required(&params.end),
    ) else {
        return Err(bad_request("Missing parameters stationId, start or end"));
    };

    state
        .ingest
        .ingest_range(station_id, start, end)
        .await
        .map(Json)
        .map_err(|e| ingest_error("/api/wu/history/range", e))
}
