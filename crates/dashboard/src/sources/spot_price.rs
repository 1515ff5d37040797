use anyhow::{bail, Result};
use serde_json::Value;
use tracing::info;

use super::fallback::{first_available, Attempt};
use super::http::{number_field, UpstreamClient};
use crate::config::{enabled, ProviderConfig};
use crate::errors::DashboardError;
use crate::types::SpotPrice;

const FEED: &str = "spot_price";

/// Latest BTC/USD price from the first provider that answers with a usable
/// number.
pub struct SpotPriceSource {
    http: UpstreamClient,
    providers: Vec<ProviderConfig>,
}

impl SpotPriceSource {
    pub fn new(http: UpstreamClient, providers: Vec<ProviderConfig>) -> Self {
        Self { http, providers }
    }

    /// Never fails: exhaustion yields `{price: None, source: "unavailable"}`.
    pub async fn fetch(&self) -> SpotPrice {
        let attempts = enabled(&self.providers)
            .map(|p| Attempt::new(p.name.as_str(), self.query_provider(p)))
            .collect();

        match first_available(FEED, attempts).await {
            Some(sourced) => {
                info!(price = sourced.value, source = %sourced.provider, "spot price updated");
                SpotPrice {
                    price: Some(sourced.value),
                    source: sourced.provider,
                }
            }
            None => SpotPrice::unavailable(),
        }
    }

    async fn query_provider(&self, provider: &ProviderConfig) -> Result<f64> {
        let (path, params): (&str, &[(&str, &str)]) = match provider.name.as_str() {
            "coingecko" => (
                "/api/v3/simple/price",
                &[("ids", "bitcoin"), ("vs_currencies", "usd")],
            ),
            "coinbase" => ("/v2/prices/BTC-USD/spot", &[]),
            "kraken" => ("/0/public/Ticker", &[("pair", "XBTUSD")]),
            other => bail!(DashboardError::unknown_provider(FEED, other)),
        };

        let body = self
            .http
            .get_json(&provider.url(path), params, provider.timeout())
            .await?;

        let price = match provider.name.as_str() {
            "coingecko" => parse_coingecko(&body),
            "coinbase" => parse_coinbase(&body),
            _ => parse_kraken(&body),
        }?;

        ensure_usable(&provider.name, price)
    }
}

// ---------------------------------------------------------------------------
// Payload parsers
// ---------------------------------------------------------------------------

/// `{"bitcoin": {"usd": 97000.5}}`
pub fn parse_coingecko(body: &Value) -> Result<f64, DashboardError> {
    body.pointer("/bitcoin/usd")
        .and_then(number_field)
        .ok_or_else(|| DashboardError::malformed("coingecko", "missing bitcoin.usd"))
}

/// `{"data": {"amount": "97000.50", ...}}`
pub fn parse_coinbase(body: &Value) -> Result<f64, DashboardError> {
    body.pointer("/data/amount")
        .and_then(number_field)
        .ok_or_else(|| DashboardError::malformed("coinbase", "missing data.amount"))
}

/// `{"result": {"XXBTZUSD": {"c": ["97000.5", "0.01"], ...}}}`
///
/// The pair key varies with Kraken's asset naming, so the first pair object
/// in `result` is used.
pub fn parse_kraken(body: &Value) -> Result<f64, DashboardError> {
    kraken_pair(body)
        .and_then(|pair| pair.pointer("/c/0"))
        .and_then(number_field)
        .ok_or_else(|| DashboardError::malformed("kraken", "missing result.<pair>.c[0]"))
}

/// First pair entry of a Kraken `result` object (skipping the `last` cursor).
pub(crate) fn kraken_pair(body: &Value) -> Option<&Value> {
    if let Some(errors) = body.get("error").and_then(Value::as_array) {
        if !errors.is_empty() {
            return None;
        }
    }
    body.get("result")?
        .as_object()?
        .iter()
        .find(|(key, _)| key.as_str() != "last")
        .map(|(_, v)| v)
}

fn ensure_usable(provider: &str, price: f64) -> Result<f64> {
    if !price.is_finite() || price <= 0.0 {
        bail!(DashboardError::malformed(
            provider,
            format!("non-positive price {price}")
        ));
    }
    Ok(price)
}
