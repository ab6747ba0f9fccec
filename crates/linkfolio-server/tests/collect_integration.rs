use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use linkfolio_core::config::Config;
use linkfolio_core::event::LinkKind;
use linkfolio_core::store::EventStore;
use linkfolio_duckdb::DuckDbBackend;
use linkfolio_server::app::build_app;
use linkfolio_server::state::AppState;

fn test_config() -> Config {
    Config {
        port: 0,
        data_dir: "/tmp/linkfolio-test".to_string(),
        duckdb_memory_limit: "1GB".to_string(),
        timezone: chrono_tz::UTC,
        session_secret: Some("test-secret".to_string()),
        session_days: 7,
        cors_origins: vec![],
        buffer_flush_interval_ms: 5000,
        buffer_max_size: 100,
    }
}

fn setup() -> (Arc<AppState>, axum::Router) {
    let db = DuckDbBackend::open_in_memory().expect("in-memory DuckDB");
    let state = Arc::new(AppState::new(db, test_config()));
    let app = build_app(Arc::clone(&state));
    (state, app)
}

async fn json_body(response: axum::http::Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("parse JSON")
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .header("User-Agent", "Mozilla/5.0 (integration test)")
        .body(Body::from(body.to_string()))
        .expect("build request")
}

#[tokio::test]
async fn test_record_view_is_buffered_then_flushed() {
    let (state, app) = setup();

    let response = app
        .oneshot(post_json(
            "/api/views",
            json!({ "owner_id": "ana", "referrer": "https://www.google.com/search?q=ana" }),
        ))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(json_body(response).await["ok"], true);

    assert_eq!(state.buffer.lock().await.len(), 1);
    assert_eq!(state.store.fetch_count("ana", None).await.expect("count"), 0);

    state.flush_buffer().await;

    assert!(state.buffer.lock().await.is_empty());
    let views = state
        .store
        .fetch_view_events("ana", None)
        .await
        .expect("views");
    assert_eq!(views.len(), 1);
    assert_eq!(
        views[0].referrer.as_deref(),
        Some("https://www.google.com/search?q=ana")
    );
    assert_eq!(
        views[0].user_agent.as_deref(),
        Some("Mozilla/5.0 (integration test)")
    );
}

#[tokio::test]
async fn test_record_view_blank_referrer_stored_as_direct() {
    let (state, app) = setup();

    let response = app
        .oneshot(post_json(
            "/api/views",
            json!({ "owner_id": "ana", "referrer": "   " }),
        ))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    state.flush_buffer().await;
    let views = state
        .store
        .fetch_view_events("ana", None)
        .await
        .expect("views");
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].referrer, None);
}

#[tokio::test]
async fn test_record_view_missing_owner_is_400() {
    let (state, app) = setup();

    let response = app
        .oneshot(post_json("/api/views", json!({ "owner_id": "  " })))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "validation_error");
    assert_eq!(json["error"]["field"], "owner_id");
    assert!(state.buffer.lock().await.is_empty());
}

#[tokio::test]
async fn test_record_view_unknown_field_is_rejected() {
    let (_state, app) = setup();

    let response = app
        .oneshot(post_json(
            "/api/views",
            json!({ "owner_id": "ana", "page": "/ana" }),
        ))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"]["code"], "validation_error");
}

#[tokio::test]
async fn test_record_social_click_uses_canonical_label() {
    let (state, app) = setup();

    let response = app
        .oneshot(post_json(
            "/api/clicks",
            json!({
                "owner_id": "ana",
                "link_kind": "social",
                "link_label": "linkedin"
            }),
        ))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    state.flush_buffer().await;
    let clicks = state.store.fetch_click_events("ana").await.expect("clicks");
    assert_eq!(clicks.len(), 1);
    assert_eq!(clicks[0].link_kind, LinkKind::Social);
    assert_eq!(clicks[0].link_label, "LinkedIn");
    assert_eq!(clicks[0].link_id, None);
}

#[tokio::test]
async fn test_record_custom_click_keeps_label_and_id() {
    let (state, app) = setup();

    let response = app
        .oneshot(post_json(
            "/api/clicks",
            json!({
                "owner_id": "ana",
                "link_kind": "custom",
                "link_id": "lnk_42",
                "link_label": "Mi Portfolio",
                "referrer": "https://t.co/abc"
            }),
        ))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    state.flush_buffer().await;
    let clicks = state.store.fetch_click_events("ana").await.expect("clicks");
    assert_eq!(clicks.len(), 1);
    assert_eq!(clicks[0].link_kind, LinkKind::Custom);
    assert_eq!(clicks[0].link_id.as_deref(), Some("lnk_42"));
    assert_eq!(clicks[0].link_label, "Mi Portfolio");
    assert_eq!(clicks[0].referrer.as_deref(), Some("https://t.co/abc"));
}

#[tokio::test]
async fn test_record_unknown_social_platform_is_400() {
    let (state, app) = setup();

    let response = app
        .oneshot(post_json(
            "/api/clicks",
            json!({
                "owner_id": "ana",
                "link_kind": "social",
                "link_label": "MySpace"
            }),
        ))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"]["field"], "link_label");
    assert!(state.buffer.lock().await.is_empty());
}

#[tokio::test]
async fn test_buffer_flushes_when_full() {
    let db = DuckDbBackend::open_in_memory().expect("in-memory DuckDB");
    let mut config = test_config();
    config.buffer_max_size = 3;
    let state = Arc::new(AppState::new(db, config));
    let app = build_app(Arc::clone(&state));

    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(post_json("/api/views", json!({ "owner_id": "ana" })))
            .await
            .expect("request");
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    assert!(state.buffer.lock().await.is_empty());
    assert_eq!(state.store.fetch_count("ana", None).await.expect("count"), 3);
}

#[tokio::test]
async fn test_record_rate_limit_per_ip() {
    let (_state, app) = setup();

    for _ in 0..60 {
        let mut request = post_json("/api/views", json!({ "owner_id": "ana" }));
        request
            .headers_mut()
            .insert("X-Forwarded-For", "203.0.113.7".parse().expect("header"));
        let response = app.clone().oneshot(request).await.expect("request");
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    let mut request = post_json("/api/views", json!({ "owner_id": "ana" }));
    request
        .headers_mut()
        .insert("X-Forwarded-For", "203.0.113.7".parse().expect("header"));
    let response = app.clone().oneshot(request).await.expect("request");
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json_body(response).await["error"]["code"], "rate_limited");

    let mut request = post_json("/api/views", json!({ "owner_id": "ana" }));
    request
        .headers_mut()
        .insert("X-Forwarded-For", "198.51.100.1".parse().expect("header"));
    let response = app.oneshot(request).await.expect("request");
    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn test_rate_limit_without_forwarded_header_is_per_peer() {
    let (state, app) = setup();

    for i in 0..61u8 {
        let mut request = post_json(
            "/api/views",
            json!({ "owner_id": "ana", "referrer": format!("https://ref{i}.example/") }),
        );
        let peer: SocketAddr = format!("192.0.2.{i}:40000").parse().expect("peer addr");
        request.extensions_mut().insert(ConnectInfo(peer));
        let response = app.clone().oneshot(request).await.expect("request");
        assert_eq!(response.status(), StatusCode::ACCEPTED, "request {i}");
    }

    state.flush_buffer().await;
    assert_eq!(state.store.fetch_count("ana", None).await.expect("count"), 61);

    // The same peer is still limited on its own.
    let peer: SocketAddr = "192.0.2.200:40000".parse().expect("peer addr");
    for _ in 0..60 {
        let mut request = post_json("/api/views", json!({ "owner_id": "ana" }));
        request.extensions_mut().insert(ConnectInfo(peer));
        let response = app.clone().oneshot(request).await.expect("request");
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }
    let mut request = post_json("/api/views", json!({ "owner_id": "ana" }));
    request.extensions_mut().insert(ConnectInfo(peer));
    let response = app.oneshot(request).await.expect("request");
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_social_platform_catalog_lists_icons() {
    let (_state, app) = setup();

    let request = Request::builder()
        .uri("/api/social-platforms")
        .body(Body::empty())
        .expect("build request");
    let response = app.oneshot(request).await.expect("request");
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    let platforms = json["data"].as_array().expect("array");
    assert_eq!(platforms.len(), 5);
    assert_eq!(platforms[0]["platform"], "instagram");
    assert_eq!(platforms[0]["label"], "Instagram");
    assert_eq!(platforms[0]["icon"], "instagram");
    assert_eq!(platforms[2]["label"], "TikTok");
    assert_eq!(platforms[2]["icon"], "music");
}
