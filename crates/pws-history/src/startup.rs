use crate::{
    health, history, history_range, local_weather, routes, HistoryFetcher, HistoryIngest,
    ObservationStore,
};
use axum::{
    body::Body,
    extract::Request,
    http::{
        header::{CACHE_CONTROL, EXPIRES, PRAGMA},
        HeaderName, HeaderValue,
    },
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use log::info;
use std::{path::Path, sync::Arc};
use tower_http::services::{ServeDir, ServeFile};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

const SURROGATE_CONTROL: HeaderName = HeaderName::from_static("surrogate-control");

#[derive(Clone)]
pub struct AppState {
    pub static_dir: String,
    pub ingest: Arc<HistoryIngest>,
    pub store: Arc<dyn ObservationStore>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::health::health,
        routes::wu::history_routes::history,
        routes::wu::history_routes::history_range,
        routes::local::weather_routes::local_weather,
    ),
    components(
        schemas(
            routes::ErrorResponse,
            crate::RangeHistory,
            crate::StoredObservation,
        )
    ),
    tags(
        (name = "pws history api", description = "fetches Weather Underground PWS history into a local store and serves it back")
    )
)]
struct ApiDoc;

pub fn build_app_state(
    static_dir: String,
    fetcher: Arc<dyn HistoryFetcher>,
    store: Arc<dyn ObservationStore>,
    max_concurrent_days: Option<usize>,
) -> AppState {
    let ingest = Arc::new(HistoryIngest::new(
        fetcher,
        store.clone(),
        max_concurrent_days,
    ));

    AppState {
        static_dir,
        ingest,
        store,
    }
}

pub fn app(app_state: AppState) -> Router {
    let api_docs = ApiDoc::openapi();
    let entry_page = Path::new(&app_state.static_dir).join("index.html");
    let serve_static = ServeDir::new(&app_state.static_dir).fallback(ServeFile::new(entry_page));

    let api = Router::new()
        .route("/api/wu/history", get(history))
        .route("/api/wu/history/range", get(history_range))
        .route("/api/local/weather", get(local_weather));

    Router::new()
        .route("/health", get(health))
        .merge(api)
        .with_state(Arc::new(app_state))
        .merge(Scalar::with_url("/docs", api_docs))
        .fallback_service(serve_static)
        .layer(middleware::from_fn(disable_caching))
        .layer(middleware::from_fn(log_request))
}

fn is_api_path(path: &str) -> bool {
    path == "/api" || path.starts_with("/api/")
}

/// Anything under `/api`, matched or not, must never be served from a cache.
async fn disable_caching(request: Request<Body>, next: Next) -> Response {
    let is_api = is_api_path(request.uri().path());
    let mut response = next.run(request).await;
    if !is_api {
        return response;
    }
    let headers = response.headers_mut();
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static("no-store, no-cache, must-revalidate, proxy-revalidate"),
    );
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(EXPIRES, HeaderValue::from_static("0"));
    headers.insert(SURROGATE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

async fn log_request(request: Request<Body>, next: Next) -> impl IntoResponse {
    let now = time::OffsetDateTime::now_utc();
    let path = request
        .uri()
        .path_and_query()
        .map(|p| p.as_str())
        .unwrap_or_default();
    info!(target: "http_request", "new request, {} {}", request.method().as_str(), path);

    let response = next.run(request).await;
    let response_time = time::OffsetDateTime::now_utc() - now;
    info!(target: "http_response", "response, code: {}, time: {}", response.status().as_str(), response_time);

    response
}
