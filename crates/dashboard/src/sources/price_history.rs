use anyhow::{bail, Result};
use serde_json::Value;
use tracing::info;

use super::fallback::{first_available, Attempt};
use super::http::{integer_field, number_field, UpstreamClient};
use super::spot_price::kraken_pair;
use crate::config::{enabled, ProviderConfig};
use crate::constants::{
    DAYS_PER_WEEK, MAX_HISTORY_POINTS, MIN_DOWNSAMPLED_WEEKLY_POINTS, MIN_NATIVE_WEEKLY_POINTS,
};
use crate::errors::DashboardError;
use crate::types::{Granularity, HistoryHorizon, PriceSeries};

const FEED: &str = "price_history";

/// Kraken OHLC intervals in minutes.
const KRAKEN_WEEKLY_INTERVAL: &str = "10080";
const KRAKEN_DAILY_INTERVAL: &str = "1440";

/// Weekly (long) and daily (short) close-price history.
pub struct PriceHistorySource {
    http: UpstreamClient,
    long_providers: Vec<ProviderConfig>,
    short_providers: Vec<ProviderConfig>,
}

impl PriceHistorySource {
    pub fn new(
        http: UpstreamClient,
        long_providers: Vec<ProviderConfig>,
        short_providers: Vec<ProviderConfig>,
    ) -> Self {
        Self {
            http,
            long_providers,
            short_providers,
        }
    }

    /// Fetch the series for `horizon`, trying that horizon's providers in
    /// order. Fails with [`DashboardError::HistoryUnavailable`] only after
    /// every candidate was rejected.
    pub async fn fetch(&self, horizon: HistoryHorizon) -> Result<PriceSeries, DashboardError> {
        let providers = match horizon {
            HistoryHorizon::Long => &self.long_providers,
            HistoryHorizon::Short { .. } => &self.short_providers,
        };

        let attempts = enabled(providers)
            .map(|p| Attempt::new(p.name.as_str(), self.query_provider(p, horizon)))
            .collect();

        match first_available(FEED, attempts).await {
            Some(sourced) => {
                info!(
                    %horizon,
                    source = %sourced.provider,
                    points = sourced.value.len(),
                    "price history loaded"
                );
                Ok(sourced.value)
            }
            None => Err(DashboardError::HistoryUnavailable { horizon }),
        }
    }

    async fn query_provider(
        &self,
        provider: &ProviderConfig,
        horizon: HistoryHorizon,
    ) -> Result<PriceSeries> {
        let granularity = horizon.granularity();
        let series = match (provider.name.as_str(), horizon) {
            ("coingecko_daily", HistoryHorizon::Long) => {
                let body = self
                    .http
                    .get_json(
                        &provider.url("/api/v3/coins/bitcoin/market_chart"),
                        &[("vs_currency", "usd"), ("days", "max"), ("interval", "daily")],
                        provider.timeout(),
                    )
                    .await?;
                let weekly = parse_coingecko_market_chart(&body)?
                    .downsample(DAYS_PER_WEEK, granularity);
                require_more_than(&provider.name, weekly, MIN_DOWNSAMPLED_WEEKLY_POINTS)?
            }
            ("binance_weekly", HistoryHorizon::Long) => {
                let body = self
                    .binance_klines(provider, "1w", MAX_HISTORY_POINTS)
                    .await?;
                let weekly = parse_binance_klines(&body, granularity)?;
                require_more_than(&provider.name, weekly, MIN_NATIVE_WEEKLY_POINTS)?
            }
            ("kraken_weekly", HistoryHorizon::Long) => {
                let body = self.kraken_ohlc(provider, KRAKEN_WEEKLY_INTERVAL).await?;
                let weekly = parse_kraken_ohlc(&body, granularity)?;
                require_more_than(&provider.name, weekly.keep_last(MAX_HISTORY_POINTS), 0)?
            }
            ("binance_daily", HistoryHorizon::Short { limit }) => {
                let body = self.binance_klines(provider, "1d", limit).await?;
                let daily = parse_binance_klines(&body, granularity)?;
                require_more_than(&provider.name, daily, 0)?
            }
            ("kraken_daily", HistoryHorizon::Short { limit }) => {
                let body = self.kraken_ohlc(provider, KRAKEN_DAILY_INTERVAL).await?;
                let daily = parse_kraken_ohlc(&body, granularity)?;
                require_more_than(&provider.name, daily.keep_last(limit), 0)?
            }
            (other, horizon) => {
                bail!(DashboardError::unknown_provider(format!("{FEED} ({horizon})"), other))
            }
        };

        Ok(series)
    }

    async fn binance_klines(
        &self,
        provider: &ProviderConfig,
        interval: &str,
        limit: usize,
    ) -> Result<Value> {
        let limit = limit.clamp(1, MAX_HISTORY_POINTS).to_string();
        self.http
            .get_json(
                &provider.url("/api/v3/klines"),
                &[("symbol", "BTCUSDT"), ("interval", interval), ("limit", limit.as_str())],
                provider.timeout(),
            )
            .await
    }

    async fn kraken_ohlc(&self, provider: &ProviderConfig, interval: &str) -> Result<Value> {
        self.http
            .get_json(
                &provider.url("/0/public/OHLC"),
                &[("pair", "XBTUSD"), ("interval", interval)],
                provider.timeout(),
            )
            .await
    }
}

// ---------------------------------------------------------------------------
// Acceptance
// ---------------------------------------------------------------------------

fn require_more_than(
    provider: &str,
    series: PriceSeries,
    required: usize,
) -> Result<PriceSeries, DashboardError> {
    if series.len() > required {
        Ok(series)
    } else {
        Err(DashboardError::InsufficientData {
            provider: provider.to_string(),
            points: series.len(),
            required,
        })
    }
}

// ---------------------------------------------------------------------------
// Payload parsers
// ---------------------------------------------------------------------------

/// `{"prices": [[ms, price], ...], ...}` (daily points).
pub fn parse_coingecko_market_chart(body: &Value) -> Result<PriceSeries, DashboardError> {
    let rows = body
        .get("prices")
        .and_then(Value::as_array)
        .ok_or_else(|| DashboardError::malformed("coingecko_daily", "missing prices array"))?;

    let pairs = rows.iter().filter_map(|row| {
        let ts = row.get(0).and_then(integer_field)?;
        let price = row.get(1).and_then(number_field)?;
        Some((ts, price))
    });
    Ok(PriceSeries::from_pairs(Granularity::Daily, pairs))
}

/// Binance klines: `[[openTime, open, high, low, close, volume, ...], ...]`
/// with `openTime` in ms and prices as strings.
pub fn parse_binance_klines(
    body: &Value,
    granularity: Granularity,
) -> Result<PriceSeries, DashboardError> {
    let rows = body
        .as_array()
        .ok_or_else(|| DashboardError::malformed("binance", "klines response not an array"))?;

    let pairs = rows.iter().filter_map(|row| {
        let items = row.as_array().filter(|a| a.len() >= 5)?;
        Some((integer_field(&items[0])?, number_field(&items[4])?))
    });
    Ok(PriceSeries::from_pairs(granularity, pairs))
}

/// Kraken OHLC: `{"result": {"XXBTZUSD": [[time_s, o, h, l, c, vwap, vol, n], ...], "last": ...}}`.
pub fn parse_kraken_ohlc(
    body: &Value,
    granularity: Granularity,
) -> Result<PriceSeries, DashboardError> {
    let rows = kraken_pair(body)
        .and_then(Value::as_array)
        .ok_or_else(|| DashboardError::malformed("kraken", "missing result.<pair> OHLC array"))?;

    let pairs = rows.iter().filter_map(|row| {
        let items = row.as_array().filter(|a| a.len() >= 5)?;
        let millis = integer_field(&items[0])?.checked_mul(1000)?;
        Some((millis, number_field(&items[4])?))
    });
    Ok(PriceSeries::from_pairs(granularity, pairs))
}
