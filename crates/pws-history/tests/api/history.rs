use crate::helpers::{
    day_payload, get, spawn_app, spawn_app_with_store, MockHistoryClient, MockStore,
};
use axum::http::{
    header::{CACHE_CONTROL, EXPIRES, PRAGMA},
    StatusCode,
};
use pws_history::{db, wu_client, ObservationStore, WuClient, WuConfig};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn missing_params_are_rejected_before_fetching() {
    let mut fetcher = MockHistoryClient::new();
    fetcher.expect_fetch_day().times(0);
    let test_app = spawn_app(Arc::new(fetcher)).await;

    for uri in [
        "/api/wu/history",
        "/api/wu/history?date=20240601",
        "/api/wu/history?stationId=IALFAR32",
        "/api/wu/history?stationId=&date=20240601",
    ] {
        let response = get(&test_app.app, uri).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(
            response.json(),
            json!({ "error": "Missing parameters stationId or date" })
        );
    }
}

#[tokio::test]
async fn stores_observations_and_returns_raw_payload() {
    let mut fetcher = MockHistoryClient::new();
    fetcher
        .expect_fetch_day()
        .withf(|station_id, date| station_id == "IALFAR32" && date == "20240601")
        .times(1)
        .returning(|station_id, date| Ok(day_payload(station_id, date)));
    let test_app = spawn_app(Arc::new(fetcher)).await;

    let response = get(
        &test_app.app,
        "/api/wu/history?stationId=IALFAR32&date=20240601",
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), day_payload("IALFAR32", "20240601"));

    let rows = test_app.database.latest_observations(10).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows
        .iter()
        .all(|r| r.station_id.as_deref() == Some("IALFAR32") && r.date.as_deref() == Some("20240601")));

    // newest local time first; the evening reading has no metrics at all
    assert_eq!(rows[0].obs_time_local.as_deref(), Some("2024-06-01 20:00:00"));
    assert!(rows[0].temp.is_none());
    assert!(rows[0].humidity.is_none());
    assert_eq!(rows[1].temp, Some(14.2));
    assert_eq!(rows[1].wind_dir, Some(190.0));
}

#[tokio::test]
async fn payload_without_observations_is_passed_through() {
    let mut fetcher = MockHistoryClient::new();
    fetcher
        .expect_fetch_day()
        .times(1)
        .returning(|_, _| Ok(json!({})));
    let test_app = spawn_app(Arc::new(fetcher)).await;

    let response = get(
        &test_app.app,
        "/api/wu/history?stationId=IALFAR32&date=20240601",
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({}));
    assert!(test_app
        .database
        .latest_observations(10)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn upstream_status_is_reported_as_server_error() {
    let mut fetcher = MockHistoryClient::new();
    fetcher
        .expect_fetch_day()
        .times(1)
        .returning(|_, _| Err(wu_client::Error::Status(401)));
    let test_app = spawn_app(Arc::new(fetcher)).await;

    let response = get(
        &test_app.app,
        "/api/wu/history?stationId=IALFAR32&date=20240601",
    )
    .await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json(), json!({ "error": "WU HTTP 401" }));
}

#[tokio::test]
async fn missing_api_key_is_reported_as_server_error() {
    let client = WuClient::new(&WuConfig {
        base_url: String::from("http://127.0.0.1:9"),
        api_key: None,
    });
    let test_app = spawn_app(Arc::new(client)).await;

    let response = get(
        &test_app.app,
        "/api/wu/history?stationId=IALFAR32&date=20240601",
    )
    .await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.json(),
        json!({ "error": "WU_API_KEY is not configured" })
    );
}

#[tokio::test]
async fn unreachable_upstream_does_not_echo_the_api_key() {
    let client = WuClient::new(&WuConfig {
        base_url: String::from("http://127.0.0.1:9"),
        api_key: Some(String::from("TOPSECRETKEY")),
    });
    let test_app = spawn_app(Arc::new(client)).await;

    let response = get(
        &test_app.app,
        "/api/wu/history?stationId=IALFAR32&date=20240601",
    )
    .await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    let error = response.json()["error"].as_str().unwrap().to_owned();
    assert!(error.starts_with("Failed to reach WU"), "{}", error);
    assert!(!error.contains("TOPSECRETKEY"), "{}", error);
    assert!(!error.contains("apiKey"), "{}", error);
}

#[tokio::test]
async fn store_failure_is_reported_as_server_error() {
    let mut fetcher = MockHistoryClient::new();
    fetcher
        .expect_fetch_day()
        .times(1)
        .returning(|station_id, date| Ok(day_payload(station_id, date)));
    let mut store = MockStore::new();
    store
        .expect_insert_observations()
        .times(1)
        .returning(|_| Err(db::Error::Writer(String::from("writer channel closed"))));
    let app = spawn_app_with_store(fetcher, store);

    let response = get(&app, "/api/wu/history?stationId=IALFAR32&date=20240601").await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.json(),
        json!({ "error": "Database writer unavailable: writer channel closed" })
    );
}

#[tokio::test]
async fn api_responses_disable_caching() {
    let mut fetcher = MockHistoryClient::new();
    fetcher.expect_fetch_day().times(0);
    let test_app = spawn_app(Arc::new(fetcher)).await;

    for uri in ["/api/wu/history", "/api/local/weather"] {
        let response = get(&test_app.app, uri).await;
        assert_eq!(
            response.headers[CACHE_CONTROL],
            "no-store, no-cache, must-revalidate, proxy-revalidate"
        );
        assert_eq!(response.headers[PRAGMA], "no-cache");
        assert_eq!(response.headers[EXPIRES], "0");
        assert_eq!(response.headers["surrogate-control"], "no-store");
    }

    let response = get(&test_app.app, "/health").await;
    assert!(response.headers.get(CACHE_CONTROL).is_none());
}
