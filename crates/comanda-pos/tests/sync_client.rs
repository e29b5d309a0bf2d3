//! Integration tests for `SyncClient` and `HttpArtifactSink`.
//!
//! Uses `wiremock` to stand up a local HTTP server for each test so no
//! real network traffic is made. Covers the happy paths, the rejected
//! (non-2xx) responses, and the shape of the JSON bodies sent.

use std::time::Duration;

use chrono::{TimeZone, Utc};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use comanda_core::{Product, Table, TableStatus};
use comanda_pos::{ArtifactSink, HttpArtifactSink, PosError, SyncClient};

/// Builds a `SyncClient` against the mock server with a short timeout.
fn test_client(server: &MockServer) -> SyncClient {
    SyncClient::new(&server.uri(), Duration::from_secs(5))
        .expect("failed to build test SyncClient")
}

fn sample_tables() -> Vec<Table> {
    vec![
        Table {
            name: "Mesa 01".to_string(),
            zone: "Terraza".to_string(),
            note: Some("junto a la ventana".to_string()),
            status: TableStatus::Available,
        },
        Table::bare("Mesa 02", TableStatus::Occupied),
    ]
}

fn sample_products() -> Vec<Product> {
    vec![Product {
        category: "Entradas".to_string(),
        name: "Causa Limena".to_string(),
        stock: "12".to_string(),
        price: "18.50".to_string(),
    }]
}

// ---------------------------------------------------------------------------
// Table push
// ---------------------------------------------------------------------------

#[tokio::test]
async fn push_tables_posts_json_array_to_mesas_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/sync/mesas"))
        .and(body_json(&sample_tables()))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let result = client.push_tables(&sample_tables()).await;

    assert!(result.is_ok(), "expected Ok, got: {result:?}");
}

#[tokio::test]
async fn push_tables_maps_server_error_to_sync_variant() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/sync/mesas"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let result = client.push_tables(&sample_tables()).await;

    match result {
        Err(PosError::Sync { endpoint, status }) => {
            assert_eq!(endpoint, "/api/v1/sync/mesas");
            assert_eq!(status, 500);
        }
        other => panic!("expected Sync error, got: {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Product push
// ---------------------------------------------------------------------------

#[tokio::test]
async fn push_products_posts_json_array_to_platos_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/sync/platos"))
        .and(body_json(&sample_products()))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let result = client.push_products(&sample_products()).await;

    assert!(result.is_ok(), "expected Ok, got: {result:?}");
}

#[tokio::test]
async fn push_products_maps_rejection_to_sync_variant() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/sync/platos"))
        .respond_with(ResponseTemplate::new(422))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let result = client.push_products(&sample_products()).await;

    match result {
        Err(PosError::Sync { endpoint, status }) => {
            assert_eq!(endpoint, "/api/v1/sync/platos");
            assert_eq!(status, 422);
        }
        other => panic!("expected Sync error, got: {other:?}"),
    }
}

#[tokio::test]
async fn base_url_trailing_slash_is_tolerated() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/sync/platos"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = SyncClient::new(&format!("{}/", server.uri()), Duration::from_secs(5))
        .expect("failed to build test SyncClient");
    let result = client.push_products(&sample_products()).await;

    assert!(result.is_ok(), "expected Ok, got: {result:?}");
}

// ---------------------------------------------------------------------------
// Artifact sink
// ---------------------------------------------------------------------------

#[tokio::test]
async fn artifact_sink_posts_base64_screenshot_with_timestamp() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/artifacts"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let sink = HttpArtifactSink::new(&format!("{}/artifacts", server.uri()))
        .expect("failed to build test HttpArtifactSink");
    let captured_at = Utc.with_ymd_and_hms(2026, 8, 29, 12, 0, 0).unwrap();
    let result = sink.store_screenshot(captured_at, &[1, 2, 3]).await;

    assert!(result.is_ok(), "expected Ok, got: {result:?}");

    let requests = server.received_requests().await.expect("request recording");
    let request: &Request = &requests[0];
    let body: serde_json::Value =
        serde_json::from_slice(&request.body).expect("valid JSON body");
    assert_eq!(body["screenshot_b64"], "AQID");
    assert!(body["captured_at"]
        .as_str()
        .expect("captured_at is a string")
        .starts_with("2026-08-29T12:00:00"));
}

#[tokio::test]
async fn artifact_sink_maps_rejection_to_sync_variant() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/artifacts"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let sink = HttpArtifactSink::new(&format!("{}/artifacts", server.uri()))
        .expect("failed to build test HttpArtifactSink");
    let result = sink.store_screenshot(Utc::now(), &[0xFF]).await;

    match result {
        Err(PosError::Sync { status, .. }) => assert_eq!(status, 503),
        other => panic!("expected Sync error, got: {other:?}"),
    }
}
