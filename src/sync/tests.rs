//! Tests for the sync engine and orchestrator

use super::*;
use crate::catalog::discover;
use crate::http::{HttpClientConfig, RechargeClient};
use crate::types::BackoffType;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(server: &MockServer) -> RechargeClient {
    let config = HttpClientConfig::builder()
        .base_url(server.uri())
        .access_token("test_access_token")
        .backoff(
            BackoffType::Constant,
            Duration::from_millis(10),
            Duration::from_secs(1),
        )
        .rate_limit_penalty(Duration::from_millis(10))
        .no_rate_limit()
        .build();
    RechargeClient::with_config(config)
}

fn test_config(start_date: &str) -> TapConfig {
    TapConfig {
        access_token: "test_access_token".to_string(),
        user_agent: None,
        start_date: start_date.to_string(),
        request_timeout: None,
    }
}

/// Catalog restricted to the given streams
fn catalog_for(streams: &[&str]) -> Catalog {
    let mut catalog = discover();
    for entry in &mut catalog.streams {
        entry.selected = streams.contains(&entry.tap_stream_id.as_str());
    }
    catalog
}

async fn mount_verify(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"shop": {"id": 1}})))
        .mount(server)
        .await;
}

async fn mount_page(server: &MockServer, endpoint: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/{endpoint}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

// ============================================================================
// Message types
// ============================================================================

#[test]
fn test_message_serialization_shapes() {
    let record = Message::record("orders", json!({"id": 1}));
    let line = serde_json::to_value(&record).unwrap();
    assert_eq!(line, json!({"type": "RECORD", "stream": "orders", "record": {"id": 1}}));

    let state = Message::state(json!({"currently_syncing": null, "bookmarks": {}}));
    let line = serde_json::to_value(&state).unwrap();
    assert_eq!(line["type"], "STATE");
    assert_eq!(line["value"]["currently_syncing"], serde_json::Value::Null);

    let schema = Message::schema(
        "orders",
        json!({"properties": {}}),
        vec!["id".to_string()],
        vec!["updated_at".to_string()],
    );
    let line = serde_json::to_value(&schema).unwrap();
    assert_eq!(line["type"], "SCHEMA");
    assert_eq!(line["key_properties"], json!(["id"]));
    assert_eq!(line["bookmark_properties"], json!(["updated_at"]));
}

#[test]
fn test_json_line_sink_writes_lines() {
    let mut sink = JsonLineSink::new(Vec::new());
    sink.write(Message::record("orders", json!({"id": 1}))).unwrap();
    sink.write(Message::state(json!({}))).unwrap();

    let output = String::from_utf8(sink.into_inner()).unwrap();
    let lines: Vec<_> = output.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("\"RECORD\""));
    assert!(lines[1].contains("\"STATE\""));
}

// ============================================================================
// Incremental engine
// ============================================================================

#[tokio::test]
async fn test_incremental_filters_and_bookmarks() {
    let server = MockServer::start().await;
    mount_verify(&server).await;
    mount_page(
        &server,
        "orders",
        json!({
            "next_cursor": null,
            "orders": [
                {"id": 1, "updated_at": "2021-09-16T00:06:34.000000Z"},
                {"id": 2, "updated_at": "2020-09-16T00:00:34.000000Z"},
                {"id": 3, "updated_at": "2021-10-11T00:01:32.000000Z"},
                {"id": 4, "updated_at": "2021-08-21T00:51:10.000000Z"}
            ]
        }),
    )
    .await;

    let client = test_client(&server);
    let config = test_config("2021-01-01T00:00:00Z");
    let catalog = catalog_for(&["orders"]);
    let mut state = SyncState::new();
    let mut sink = VecSink::new();

    let stats = sync_all(&client, &config, &catalog, &mut state, &mut sink)
        .await
        .unwrap();

    // The 2020 record precedes the start date and is silently dropped
    let records = sink.records_for("orders");
    assert_eq!(records.len(), 3);
    assert_eq!(stats.records_emitted, 3);
    assert_eq!(stats.records_filtered, 1);

    // Final bookmark is the maximum replication-key value emitted
    assert_eq!(
        state.get_bookmark("orders", None),
        Some("2021-10-11T00:01:32.000000Z".to_string())
    );
}

#[tokio::test]
async fn test_missing_replication_key_tolerated() {
    let server = MockServer::start().await;
    mount_verify(&server).await;
    mount_page(
        &server,
        "orders",
        json!({
            "next_cursor": null,
            "orders": [
                {"id": 1, "updated_at": "2021-09-16T00:06:34.000000Z"},
                {"id": 2, "updated_at": "2020-09-16T00:00:34.000000Z"},
                {"id": 3},
                {"id": 4, "updated_at": "2021-08-21T00:51:10.000000Z"}
            ]
        }),
    )
    .await;

    let client = test_client(&server);
    let config = test_config("2021-01-01T00:00:00Z");
    let catalog = catalog_for(&["orders"]);
    let mut state = SyncState::new();
    let mut sink = VecSink::new();

    sync_all(&client, &config, &catalog, &mut state, &mut sink)
        .await
        .unwrap();

    // The keyless record is emitted but cannot advance the watermark
    assert_eq!(sink.records_for("orders").len(), 3);
    assert_eq!(
        state.get_bookmark("orders", None),
        Some("2021-09-16T00:06:34.000000Z".to_string())
    );
}

#[tokio::test]
async fn test_bookmark_never_regresses() {
    let server = MockServer::start().await;
    mount_verify(&server).await;
    mount_page(
        &server,
        "orders",
        json!({
            "next_cursor": null,
            "orders": [
                {"id": 1, "updated_at": "2021-03-01T00:00:00.000000Z"}
            ]
        }),
    )
    .await;

    let client = test_client(&server);
    let config = test_config("2021-01-01T00:00:00Z");
    let catalog = catalog_for(&["orders"]);
    let mut state = SyncState::new();
    state.set_bookmark("orders", "2021-06-01T00:00:00.000000Z".to_string());
    let mut sink = VecSink::new();

    sync_all(&client, &config, &catalog, &mut state, &mut sink)
        .await
        .unwrap();

    // Everything was below the prior bookmark: nothing emitted, bookmark kept
    assert!(sink.records_for("orders").is_empty());
    assert_eq!(
        state.get_bookmark("orders", None),
        Some("2021-06-01T00:00:00.000000Z".to_string())
    );
}

#[tokio::test]
async fn test_boundary_record_is_emitted() {
    let server = MockServer::start().await;
    mount_verify(&server).await;
    mount_page(
        &server,
        "orders",
        json!({
            "next_cursor": null,
            "orders": [
                {"id": 1, "updated_at": "2021-01-01T00:00:00.000000Z"}
            ]
        }),
    )
    .await;

    let client = test_client(&server);
    let config = test_config("2021-01-01T00:00:00Z");
    let catalog = catalog_for(&["orders"]);
    let mut state = SyncState::new();
    let mut sink = VecSink::new();

    sync_all(&client, &config, &catalog, &mut state, &mut sink)
        .await
        .unwrap();

    // Records exactly at the bookmark are replicated (at-least-once)
    assert_eq!(sink.records_for("orders").len(), 1);
}

#[tokio::test]
async fn test_unparseable_replication_key_aborts() {
    let server = MockServer::start().await;
    mount_verify(&server).await;
    mount_page(
        &server,
        "orders",
        json!({
            "next_cursor": null,
            "orders": [
                {"id": 1, "updated_at": "not a datetime"}
            ]
        }),
    )
    .await;

    let client = test_client(&server);
    let config = test_config("2021-01-01T00:00:00Z");
    let catalog = catalog_for(&["orders"]);
    let mut state = SyncState::new();
    let mut sink = VecSink::new();

    let err = sync_all(&client, &config, &catalog, &mut state, &mut sink)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ReplicationKey { .. }));
}

// ============================================================================
// Full table engine
// ============================================================================

#[tokio::test]
async fn test_full_table_keeps_no_bookmark() {
    let server = MockServer::start().await;
    mount_verify(&server).await;
    mount_page(
        &server,
        "shop",
        json!({"shop": {"id": 1, "name": "Test Shop", "updated_at": "2021-09-16T00:06:34.000000Z"}}),
    )
    .await;

    let client = test_client(&server);
    let config = test_config("2021-01-01T00:00:00Z");
    let catalog = catalog_for(&["shop"]);
    let mut state = SyncState::new();
    let mut sink = VecSink::new();

    sync_all(&client, &config, &catalog, &mut state, &mut sink)
        .await
        .unwrap();

    assert_eq!(sink.records_for("shop").len(), 1);
    assert!(state.bookmarks.is_empty());
    assert_eq!(sink.last_state().unwrap()["bookmarks"], json!({}));
}

// ============================================================================
// Orchestrator
// ============================================================================

#[tokio::test]
async fn test_message_ordering_and_pointer_lifecycle() {
    let server = MockServer::start().await;
    mount_verify(&server).await;
    mount_page(
        &server,
        "orders",
        json!({
            "next_cursor": null,
            "orders": [{"id": 1, "updated_at": "2021-09-16T00:06:34.000000Z"}]
        }),
    )
    .await;

    let client = test_client(&server);
    let config = test_config("2021-01-01T00:00:00Z");
    let catalog = catalog_for(&["orders"]);
    let mut state = SyncState::new();
    let mut sink = VecSink::new();

    sync_all(&client, &config, &catalog, &mut state, &mut sink)
        .await
        .unwrap();

    // STATE(currently_syncing=orders), SCHEMA, RECORD, STATE(bookmark), STATE(done)
    let kinds: Vec<_> = sink
        .messages
        .iter()
        .map(|m| match m {
            Message::Schema { .. } => "SCHEMA",
            Message::Record { .. } => "RECORD",
            Message::State { .. } => "STATE",
        })
        .collect();
    assert_eq!(kinds, vec!["STATE", "SCHEMA", "RECORD", "STATE", "STATE"]);

    let first_state = &sink.messages[0];
    if let Message::State { value } = first_state {
        assert_eq!(value["currently_syncing"], "orders");
    }

    // Terminal checkpoint clears the pointer
    assert_eq!(
        sink.last_state().unwrap()["currently_syncing"],
        serde_json::Value::Null
    );
    assert!(state.currently_syncing.is_none());
}

#[tokio::test]
async fn test_streams_processed_in_catalog_order() {
    let server = MockServer::start().await;
    mount_verify(&server).await;
    mount_page(
        &server,
        "addresses",
        json!({"next_cursor": null, "addresses": [{"id": 1, "updated_at": "2021-09-16T00:06:34.000000Z"}]}),
    )
    .await;
    mount_page(
        &server,
        "orders",
        json!({"next_cursor": null, "orders": [{"id": 2, "updated_at": "2021-09-16T00:06:34.000000Z"}]}),
    )
    .await;

    let client = test_client(&server);
    let config = test_config("2021-01-01T00:00:00Z");
    let catalog = catalog_for(&["orders", "addresses"]);
    let mut state = SyncState::new();
    let mut sink = VecSink::new();

    sync_all(&client, &config, &catalog, &mut state, &mut sink)
        .await
        .unwrap();

    let record_streams: Vec<_> = sink
        .messages
        .iter()
        .filter_map(|m| match m {
            Message::Record { stream, .. } => Some(stream.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(record_streams, vec!["addresses", "orders"]);
}

#[tokio::test]
async fn test_deprecated_stream_fails_after_completion() {
    let server = MockServer::start().await;
    mount_verify(&server).await;
    mount_page(
        &server,
        "products",
        json!({"products": [{"id": 1, "updated_at": "2021-09-16T00:06:34.000000Z"}]}),
    )
    .await;

    let client = test_client(&server);
    let config = test_config("2021-01-01T00:00:00Z");
    let catalog = catalog_for(&["products"]);
    let mut state = SyncState::new();
    let mut sink = VecSink::new();

    let err = sync_all(&client, &config, &catalog, &mut state, &mut sink)
        .await
        .unwrap_err();

    // The failure is post-hoc: records and the terminal checkpoint landed first
    assert!(matches!(err, Error::DeprecatedStream { .. }));
    assert!(err.to_string().contains("`products`"));
    assert_eq!(sink.records_for("products").len(), 1);
    assert_eq!(
        sink.last_state().unwrap()["currently_syncing"],
        serde_json::Value::Null
    );
    assert!(state.get_bookmark("products", None).is_some());
}

#[tokio::test]
async fn test_unknown_selected_stream_fails() {
    let server = MockServer::start().await;
    let client = test_client(&server);
    let config = test_config("2021-01-01T00:00:00Z");

    let catalog = Catalog::from_json(
        r#"{"streams": [{
            "tap_stream_id": "plans",
            "schema": {},
            "replication_method": "INCREMENTAL",
            "replication_key": "updated_at"
        }]}"#,
    )
    .unwrap();

    let mut state = SyncState::new();
    let mut sink = VecSink::new();
    let err = sync_all(&client, &config, &catalog, &mut state, &mut sink)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::StreamNotFound { .. }));
}
