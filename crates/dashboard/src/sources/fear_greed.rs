use anyhow::{bail, Result};
use serde_json::Value;
use tracing::debug;

use super::fallback::{first_available, Attempt};
use super::http::{integer_field, UpstreamClient};
use crate::config::{enabled, ProviderConfig};
use crate::constants::FEAR_GREED_LIMIT;
use crate::errors::DashboardError;
use crate::types::FearGreedEntry;

const FEED: &str = "fear_greed";

/// Crypto fear & greed index, newest entry first.
pub struct FearGreedSource {
    http: UpstreamClient,
    providers: Vec<ProviderConfig>,
}

impl FearGreedSource {
    pub fn new(http: UpstreamClient, providers: Vec<ProviderConfig>) -> Self {
        Self { http, providers }
    }

    /// Never fails: exhaustion yields an empty history.
    pub async fn fetch(&self) -> Vec<FearGreedEntry> {
        let attempts = enabled(&self.providers)
            .map(|p| Attempt::new(p.name.as_str(), self.query_provider(p)))
            .collect();

        match first_available(FEED, attempts).await {
            Some(sourced) => {
                debug!(
                    entries = sourced.value.len(),
                    latest = sourced.value.first().map(|e| e.value),
                    "fear & greed updated"
                );
                sourced.value
            }
            None => Vec::new(),
        }
    }

    async fn query_provider(&self, provider: &ProviderConfig) -> Result<Vec<FearGreedEntry>> {
        match provider.name.as_str() {
            "alternative_me" => {
                let limit = FEAR_GREED_LIMIT.to_string();
                let body = self
                    .http
                    .get_json(
                        &provider.url("/fng/"),
                        &[("limit", limit.as_str())],
                        provider.timeout(),
                    )
                    .await?;
                Ok(parse_alternative_me(&body)?)
            }
            other => bail!(DashboardError::unknown_provider(FEED, other)),
        }
    }
}

/// `{"data": [{"value": "72", "value_classification": "Greed", "timestamp": "1700000000"}, ...]}`
///
/// Entries whose value is unparseable or outside 0..=100 are dropped.
pub fn parse_alternative_me(body: &Value) -> Result<Vec<FearGreedEntry>, DashboardError> {
    let rows = body
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| DashboardError::malformed("alternative_me", "missing data array"))?;

    let entries = rows
        .iter()
        .filter_map(|row| {
            let value = row.get("value").and_then(integer_field)?;
            if !(0..=100).contains(&value) {
                return None;
            }
            let classification = row
                .get("value_classification")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let timestamp_s = row.get("timestamp").and_then(integer_field)?;
            Some(FearGreedEntry {
                value: value as u32,
                classification,
                timestamp_ms: timestamp_s.checked_mul(1000)?,
            })
        })
        .collect();

    Ok(entries)
}
