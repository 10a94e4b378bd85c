use crate::helpers::{get, spawn_app, MockHistoryClient};
use axum::http::{header::CACHE_CONTROL, StatusCode};
use std::{fs, sync::Arc};

const INDEX: &str = "<!doctype html><title>PWS history</title>";

#[tokio::test]
async fn unknown_paths_fall_back_to_entry_page() {
    let test_app = spawn_app(Arc::new(MockHistoryClient::new())).await;
    fs::create_dir_all(&test_app.static_dir).unwrap();
    fs::write(test_app.static_dir.join("index.html"), INDEX).unwrap();

    for uri in ["/", "/charts/daily", "/index.html"] {
        let response = get(&test_app.app, uri).await;
        assert_eq!(response.status, StatusCode::OK, "{}", uri);
        assert_eq!(response.text(), INDEX);
    }
}

#[tokio::test]
async fn static_assets_are_served() {
    let test_app = spawn_app(Arc::new(MockHistoryClient::new())).await;
    fs::create_dir_all(&test_app.static_dir).unwrap();
    fs::write(test_app.static_dir.join("index.html"), INDEX).unwrap();
    fs::write(test_app.static_dir.join("app.js"), "console.log('pws');").unwrap();

    let response = get(&test_app.app, "/app.js").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text(), "console.log('pws');");
}

#[tokio::test]
async fn missing_entry_page_is_not_found() {
    let test_app = spawn_app(Arc::new(MockHistoryClient::new())).await;

    let response = get(&test_app.app, "/charts/daily").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unmatched_api_paths_fall_back_without_caching() {
    let test_app = spawn_app(Arc::new(MockHistoryClient::new())).await;
    fs::create_dir_all(&test_app.static_dir).unwrap();
    fs::write(test_app.static_dir.join("index.html"), INDEX).unwrap();

    let response = get(&test_app.app, "/api/unknown").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text(), INDEX);
    assert_eq!(
        response.headers[CACHE_CONTROL],
        "no-store, no-cache, must-revalidate, proxy-revalidate"
    );
    assert_eq!(response.headers["surrogate-control"], "no-store");

    let response = get(&test_app.app, "/apiary").await;
    assert_eq!(response.text(), INDEX);
    assert!(response.headers.get("surrogate-control").is_none());
}
