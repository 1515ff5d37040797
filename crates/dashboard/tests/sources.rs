//! Feed adapters against a mock upstream.

mod common;

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use btc_dashboard::errors::DashboardError;
use btc_dashboard::types::{Granularity, HistoryHorizon};
use common::*;

// ---------------------------------------------------------------------------
// Spot price
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_spot_price_falls_through_to_second_provider() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/simple/price"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/prices/BTC-USD/spot"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": {"amount": "96500.25"}})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/0/public/Ticker"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let sources = sources(&server.uri());
    let spot = sources.spot_price.fetch().await;

    assert_eq!(spot.price, Some(96_500.25));
    assert_eq!(spot.source, "coinbase");
}

#[tokio::test]
async fn test_spot_price_rejects_non_positive_and_uses_kraken() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/simple/price"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"bitcoin": {"usd": 0}})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/prices/BTC-USD/spot"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/0/public/Ticker"))
        .and(query_param("pair", "XBTUSD"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": [],
            "result": {"XXBTZUSD": {"c": ["95000.5", "0.1"]}}
        })))
        .mount(&server)
        .await;

    let spot = sources(&server.uri()).spot_price.fetch().await;
    assert_eq!(spot.price, Some(95_000.5));
    assert_eq!(spot.source, "kraken");
}

#[tokio::test]
async fn test_spot_price_all_down_is_unavailable() {
    let server = MockServer::start().await;
    // No mocks mounted: every request gets a 404.

    let spot = sources(&server.uri()).spot_price.fetch().await;
    assert_eq!(spot.price, None);
    assert_eq!(spot.source, "unavailable");
}

// ---------------------------------------------------------------------------
// Price history
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_long_history_prefers_downsampled_deep_history() {
    let server = MockServer::start().await;

    // 1500 daily points → 215 weekly points after keeping every 7th.
    Mock::given(method("GET"))
        .and(path("/api/v3/coins/bitcoin/market_chart"))
        .and(query_param("days", "max"))
        .respond_with(ResponseTemplate::new(200).set_body_json(coingecko_market_chart(1500, 20_000.0)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v3/klines"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let series = sources(&server.uri())
        .history
        .fetch(HistoryHorizon::Long)
        .await
        .unwrap();

    assert_eq!(series.granularity, Granularity::Weekly);
    assert_eq!(series.len(), 215);
    assert_eq!(series.points[1].timestamp - series.points[0].timestamp, 7 * DAY_MS);
}

#[tokio::test]
async fn test_long_history_rejects_short_candidates_until_kraken() {
    let server = MockServer::start().await;

    // 700 daily → 100 weekly: not more than 200.
    Mock::given(method("GET"))
        .and(path("/api/v3/coins/bitcoin/market_chart"))
        .respond_with(ResponseTemplate::new(200).set_body_json(coingecko_market_chart(700, 20_000.0)))
        .expect(1)
        .mount(&server)
        .await;
    // Exactly 100 weekly candles: not more than 100.
    Mock::given(method("GET"))
        .and(path("/api/v3/klines"))
        .and(query_param("interval", "1w"))
        .and(query_param("limit", "1000"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(binance_klines(&vec![30_000.0; 100], WEEK_MS)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/0/public/OHLC"))
        .and(query_param("interval", "10080"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(kraken_ohlc(&vec![40_000.0; 50], WEEK_MS)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let series = sources(&server.uri())
        .history
        .fetch(HistoryHorizon::Long)
        .await
        .unwrap();

    assert_eq!(series.len(), 50);
    assert_eq!(series.points[0].timestamp, START_MS);
    assert!(series.prices().all(|p| p == 40_000.0));
}

#[tokio::test]
async fn test_short_history_falls_back_to_kraken_and_keeps_limit() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/klines"))
        .and(query_param("interval", "1d"))
        .respond_with(ResponseTemplate::new(451))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/0/public/OHLC"))
        .and(query_param("interval", "1440"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(kraken_ohlc(&vec![50_000.0; 720], DAY_MS)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let series = sources(&server.uri())
        .history
        .fetch(HistoryHorizon::Short { limit: 30 })
        .await
        .unwrap();

    assert_eq!(series.granularity, Granularity::Daily);
    assert_eq!(series.len(), 30);
    assert_eq!(series.points[0].timestamp, START_MS + 690 * DAY_MS);
}

#[tokio::test]
async fn test_short_history_requests_limit_from_binance() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/klines"))
        .and(query_param("symbol", "BTCUSDT"))
        .and(query_param("interval", "1d"))
        .and(query_param("limit", "365"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(binance_klines(&vec![60_000.0; 365], DAY_MS)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let series = sources(&server.uri())
        .history
        .fetch(HistoryHorizon::Short { limit: 365 })
        .await
        .unwrap();
    assert_eq!(series.len(), 365);
}

#[tokio::test]
async fn test_history_exhaustion_is_typed_error() {
    let server = MockServer::start().await;

    let err = sources(&server.uri())
        .history
        .fetch(HistoryHorizon::Short { limit: 365 })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DashboardError::HistoryUnavailable {
            horizon: HistoryHorizon::Short { limit: 365 }
        }
    ));
}

// ---------------------------------------------------------------------------
// Fear & greed, block height, on-chain
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_fear_greed_parsed_and_failure_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fng/"))
        .and(query_param("limit", "30"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fear_greed_payload(&[25, 30, 35])))
        .mount(&server)
        .await;

    let entries = sources(&server.uri()).fear_greed.fetch().await;
    assert_eq!(entries.iter().map(|e| e.value).collect::<Vec<_>>(), vec![25, 30, 35]);
    assert_eq!(entries[0].timestamp_ms, 1_700_000_000_000);

    let down = MockServer::start().await;
    assert!(sources(&down.uri()).fear_greed.fetch().await.is_empty());
}

#[tokio::test]
async fn test_block_height_fetched_or_estimated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/q/getblockcount"))
        .respond_with(ResponseTemplate::new(200).set_body_string("880123"))
        .mount(&server)
        .await;

    let block = sources(&server.uri()).block_height.fetch().await;
    assert_eq!(block.height, 880_123);
    assert!(!block.approximate);

    let down = MockServer::start().await;
    let estimate = sources(&down.uri()).block_height.fetch().await;
    assert!(estimate.approximate);
    // Over 16 years of blocks at 144/day.
    assert!(estimate.height > 840_000);
}

#[tokio::test]
async fn test_implausible_block_height_falls_back_to_estimate() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/q/getblockcount"))
        .respond_with(ResponseTemplate::new(200).set_body_string("18446744073709551615"))
        .mount(&server)
        .await;

    let block = sources(&server.uri()).block_height.fetch().await;
    assert!(block.approximate);
    assert!(block.height < 100_000_000);
}

#[tokio::test]
async fn test_onchain_full_metrics() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v4/timeseries/asset-metrics"))
        .and(query_param("assets", "btc"))
        .and(query_param("metrics", "CapMVRVCur,NUPLCur"))
        .and(query_param("limit_per_asset", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [{
            "asset": "btc", "time": "2025-06-01T00:00:00.000000000Z",
            "CapMVRVCur": "2.31", "NUPLCur": "0.567"
        }]})))
        .expect(1)
        .mount(&server)
        .await;

    let metrics = sources(&server.uri()).onchain.fetch().await;
    assert_eq!(metrics.mvrv, Some(2.31));
    assert_eq!(metrics.nupl, Some(0.567));
    assert_eq!(metrics.source, "coinmetrics");
}

#[tokio::test]
async fn test_onchain_second_attempt_is_mvrv_only() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v4/timeseries/asset-metrics"))
        .and(query_param("metrics", "CapMVRVCur,NUPLCur"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"error": {"type": "forbidden"}})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v4/timeseries/asset-metrics"))
        .and(query_param("metrics", "CapMVRVCur"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [{
            "asset": "btc", "time": "2025-06-01T00:00:00.000000000Z", "CapMVRVCur": 1.84
        }]})))
        .expect(1)
        .mount(&server)
        .await;

    let metrics = sources(&server.uri()).onchain.fetch().await;
    assert_eq!(metrics.mvrv, Some(1.84));
    assert_eq!(metrics.nupl, None);
    assert_eq!(metrics.source, "coinmetrics-mvrv");
}

#[tokio::test]
async fn test_onchain_exhaustion_is_fallback_sentinel() {
    let server = MockServer::start().await;
    let metrics = sources(&server.uri()).onchain.fetch().await;
    assert_eq!(metrics.mvrv, None);
    assert_eq!(metrics.nupl, None);
    assert_eq!(metrics.date, None);
    assert_eq!(metrics.source, "fallback");
}
