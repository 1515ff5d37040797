//! Router behaviour through `tower::ServiceExt::oneshot`.

mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use btc_dashboard::config::ServerConfig;
use btc_dashboard::core::coordinator::Coordinator;
use btc_dashboard::server::{self, AppState};
use common::*;

fn server_config() -> ServerConfig {
    ServerConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        cors_max_age_seconds: 86_400,
    }
}

fn app(base_url: &str) -> (Router, Coordinator) {
    let sources = sources(base_url);
    let (coordinator, snapshot) = Coordinator::new(sources.clone(), &refresh_config());
    let router = server::router(AppState { sources, snapshot }, &server_config());
    (router, coordinator)
}

async fn get(router: Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_price_route() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/simple/price"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"bitcoin": {"usd": 97000.5}})))
        .mount(&upstream)
        .await;

    let (router, _) = app(&upstream.uri());
    let (status, body) = get(router, "/price").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"price": 97000.5, "source": "coingecko"}));
}

#[tokio::test]
async fn test_history_route_serves_pairs() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/klines"))
        .and(query_param("interval", "1d"))
        .and(query_param("limit", "30"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(binance_klines(&vec![61_000.0; 30], DAY_MS)),
        )
        .expect(1)
        .mount(&upstream)
        .await;

    let (router, _) = app(&upstream.uri());
    let (status, body) = get(router, "/history?days=30").await;

    assert_eq!(status, StatusCode::OK);
    let prices = body["prices"].as_array().unwrap();
    assert_eq!(prices.len(), 30);
    assert_eq!(prices[0], json!([START_MS, 61000.0]));
}

#[tokio::test]
async fn test_history_route_unavailable_is_503() {
    let upstream = MockServer::start().await;

    let (router, _) = app(&upstream.uri());
    let (status, body) = get(router, "/history?days=max").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("long"));
}

#[tokio::test]
async fn test_feargreed_route_uses_string_fields() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fng/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fear_greed_payload(&[72])))
        .mount(&upstream)
        .await;

    let (router, _) = app(&upstream.uri());
    let (status, body) = get(router, "/feargreed").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"data": [{
            "value": "72",
            "value_classification": "Fear",
            "timestamp": "1700000000"
        }]})
    );
}

#[tokio::test]
async fn test_halving_route_flags_estimate() {
    let upstream = MockServer::start().await;

    let (router, _) = app(&upstream.uri());
    let (status, body) = get(router, "/halving").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["approximate"], json!(true));
    assert!(body["blockHeight"].as_u64().unwrap() > 840_000);
}

#[tokio::test]
async fn test_onchain_route_is_always_ok() {
    let upstream = MockServer::start().await;

    let (router, _) = app(&upstream.uri());
    let (status, body) = get(router, "/onchain/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"mvrv": null, "nupl": null, "date": null, "source": "fallback"})
    );
}

#[tokio::test]
async fn test_dashboard_route_serves_latest_snapshot() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/simple/price"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"bitcoin": {"usd": 88000}})))
        .mount(&upstream)
        .await;

    let (router, mut coordinator) = app(&upstream.uri());

    let (_, before) = get(router.clone(), "/dashboard").await;
    assert_eq!(before["current_price"], Value::Null);
    assert_eq!(before["overall_risk"], json!("gray"));

    coordinator.refresh().await;

    let (status, after) = get(router, "/dashboard").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(after["current_price"], json!(88000.0));
    assert_eq!(after["price_source"], json!("coingecko"));
    assert_eq!(after["block_height_approximate"], json!(true));
}

#[tokio::test]
async fn test_cors_preflight() {
    let upstream = MockServer::start().await;
    let (router, _) = app(&upstream.uri());

    let response = router
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/price")
                .header(header::ORIGIN, "https://example.com")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "86400");
    let methods = headers[header::ACCESS_CONTROL_ALLOW_METHODS].to_str().unwrap();
    assert!(methods.contains("GET"));
    assert!(!methods.contains("POST"));
}

#[tokio::test]
async fn test_simple_request_gets_allow_origin() {
    let upstream = MockServer::start().await;
    let (router, _) = app(&upstream.uri());

    let response = router
        .oneshot(
            Request::builder()
                .uri("/onchain/metrics")
                .header(header::ORIGIN, "https://example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn test_non_get_methods_rejected() {
    let upstream = MockServer::start().await;
    let (router, _) = app(&upstream.uri());

    let response = router
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/price")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let upstream = MockServer::start().await;
    let (router, _) = app(&upstream.uri());

    let response = router
        .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
