#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{json, Value};

use btc_dashboard::config::{HistorySourcesConfig, ProviderConfig, RefreshConfig, SourcesConfig};
use btc_dashboard::sources::Sources;

pub const WEEK_MS: i64 = 604_800_000;
pub const DAY_MS: i64 = 86_400_000;

/// 2017-01-01T00:00:00Z, an arbitrary first candle.
pub const START_MS: i64 = 1_483_228_800_000;

pub fn provider(name: &str, base_url: &str) -> ProviderConfig {
    ProviderConfig {
        name: name.to_string(),
        enabled: true,
        base_url: base_url.to_string(),
        timeout_seconds: 5,
    }
}

/// Every known provider, in default order, pointed at one mock server.
pub fn sources_config(base_url: &str) -> SourcesConfig {
    let p = |name: &str| provider(name, base_url);
    SourcesConfig {
        spot_price: vec![p("coingecko"), p("coinbase"), p("kraken")],
        history: HistorySourcesConfig {
            long_providers: vec![p("coingecko_daily"), p("binance_weekly"), p("kraken_weekly")],
            short_providers: vec![p("binance_daily"), p("kraken_daily")],
        },
        fear_greed: vec![p("alternative_me")],
        block_height: vec![p("blockchain_info")],
        onchain: vec![p("coinmetrics")],
    }
}

pub fn sources(base_url: &str) -> Arc<Sources> {
    Arc::new(Sources::from_config(&sources_config(base_url)).expect("sources should build"))
}

pub fn refresh_config() -> RefreshConfig {
    RefreshConfig {
        interval_seconds: 300,
        daily_history_days: 365,
    }
}

// ---------------------------------------------------------------------------
// Upstream payload builders
// ---------------------------------------------------------------------------

/// Binance klines with the given closes, `step_ms` apart.
pub fn binance_klines(closes: &[f64], step_ms: i64) -> Value {
    let rows: Vec<Value> = closes
        .iter()
        .enumerate()
        .map(|(i, close)| {
            let open_time = START_MS + i as i64 * step_ms;
            json!([
                open_time,
                "1.0",
                "2.0",
                "0.5",
                close.to_string(),
                "10.0",
                open_time + step_ms - 1
            ])
        })
        .collect();
    Value::Array(rows)
}

/// Kraken OHLC with the given closes, `step_ms` apart, timestamps in seconds.
pub fn kraken_ohlc(closes: &[f64], step_ms: i64) -> Value {
    let rows: Vec<Value> = closes
        .iter()
        .enumerate()
        .map(|(i, close)| {
            let seconds = (START_MS + i as i64 * step_ms) / 1000;
            json!([seconds, "1.0", "2.0", "0.5", close.to_string(), "1.0", "10.0", 5])
        })
        .collect();
    json!({"error": [], "result": {"XXBTZUSD": rows, "last": 0}})
}

/// CoinGecko market chart with `n` daily points.
pub fn coingecko_market_chart(n: usize, price: f64) -> Value {
    let prices: Vec<Value> = (0..n)
        .map(|i| json!([START_MS + i as i64 * DAY_MS, price]))
        .collect();
    json!({"prices": prices, "market_caps": [], "total_volumes": []})
}

pub fn fear_greed_payload(values: &[u32]) -> Value {
    let data: Vec<Value> = values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            json!({
                "value": v.to_string(),
                "value_classification": "Fear",
                "timestamp": (1_700_000_000 - i as i64 * 86_400).to_string(),
            })
        })
        .collect();
    json!({"name": "Fear and Greed Index", "data": data})
}
