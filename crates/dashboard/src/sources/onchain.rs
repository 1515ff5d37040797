use anyhow::{bail, Result};
use serde_json::Value;
use tracing::{debug, info};

use super::fallback::{first_available, Attempt};
use super::http::{number_field, UpstreamClient};
use crate::config::{enabled, ProviderConfig};
use crate::errors::DashboardError;
use crate::types::OnChainMetrics;

const FEED: &str = "onchain";

const MVRV_METRIC: &str = "CapMVRVCur";
const NUPL_METRIC: &str = "NUPLCur";

/// MVRV / NUPL from on-chain analytics providers.
pub struct OnChainSource {
    http: UpstreamClient,
    providers: Vec<ProviderConfig>,
}

/// Which metrics an attempt asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MetricSet {
    MvrvAndNupl,
    MvrvOnly,
}

impl MetricSet {
    fn query(self) -> &'static str {
        match self {
            Self::MvrvAndNupl => "CapMVRVCur,NUPLCur",
            Self::MvrvOnly => MVRV_METRIC,
        }
    }
}

impl OnChainSource {
    pub fn new(http: UpstreamClient, providers: Vec<ProviderConfig>) -> Self {
        Self { http, providers }
    }

    /// Never fails: exhaustion yields [`OnChainMetrics::fallback`], which the
    /// coordinator later fills in from price history.
    ///
    /// Every enabled provider contributes two attempts: both metrics, then
    /// MVRV alone (tagged `<name>-mvrv`).
    pub async fn fetch(&self) -> OnChainMetrics {
        let mut attempts = Vec::new();
        for provider in enabled(&self.providers) {
            attempts.push(Attempt::new(
                provider.name.as_str(),
                self.query_provider(provider, MetricSet::MvrvAndNupl),
            ));
            attempts.push(Attempt::new(
                format!("{}-mvrv", provider.name),
                self.query_provider(provider, MetricSet::MvrvOnly),
            ));
        }

        match first_available(FEED, attempts).await {
            Some(sourced) => {
                let metrics = OnChainMetrics {
                    source: sourced.provider,
                    ..sourced.value
                };
                info!(
                    mvrv = ?metrics.mvrv,
                    nupl = ?metrics.nupl,
                    source = %metrics.source,
                    "on-chain metrics fetched"
                );
                metrics
            }
            None => {
                debug!("on-chain metrics unavailable, returning fallback");
                OnChainMetrics::fallback()
            }
        }
    }

    async fn query_provider(
        &self,
        provider: &ProviderConfig,
        metrics: MetricSet,
    ) -> Result<OnChainMetrics> {
        match provider.name.as_str() {
            "coinmetrics" => {
                let body = self
                    .http
                    .get_json(
                        &provider.url("/v4/timeseries/asset-metrics"),
                        &[
                            ("assets", "btc"),
                            ("metrics", metrics.query()),
                            ("frequency", "1d"),
                            ("limit_per_asset", "1"),
                            ("sort", "time"),
                            ("direction", "desc"),
                        ],
                        provider.timeout(),
                    )
                    .await?;
                let mut parsed = parse_coinmetrics(&body)?;
                if metrics == MetricSet::MvrvOnly {
                    parsed.nupl = None;
                }
                Ok(parsed)
            }
            other => bail!(DashboardError::unknown_provider(FEED, other)),
        }
    }
}

/// `{"data": [{"asset": "btc", "time": "...", "CapMVRVCur": "2.1", "NUPLCur": "0.52"}]}`
///
/// Accepted only when the latest row carries MVRV. Values may be strings or
/// numbers. The `source` field is left empty for the caller to tag.
pub fn parse_coinmetrics(body: &Value) -> Result<OnChainMetrics, DashboardError> {
    let latest = body
        .pointer("/data/0")
        .ok_or_else(|| DashboardError::malformed("coinmetrics", "empty data array"))?;

    let mvrv = latest
        .get(MVRV_METRIC)
        .and_then(number_field)
        .ok_or_else(|| DashboardError::malformed("coinmetrics", "latest row has no MVRV"))?;

    let nupl = latest.get(NUPL_METRIC).and_then(number_field);
    let date = latest.get("time").and_then(Value::as_str).map(str::to_string);

    Ok(OnChainMetrics {
        mvrv: Some(mvrv),
        nupl,
        date,
        source: String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_coinmetrics_both_metrics() {
        let body = json!({"data": [{
            "asset": "btc",
            "time": "2025-01-01T00:00:00.000000000Z",
            "CapMVRVCur": "2.134",
            "NUPLCur": "0.531"
        }]});
        let m = parse_coinmetrics(&body).unwrap();
        assert_eq!(m.mvrv, Some(2.134));
        assert_eq!(m.nupl, Some(0.531));
        assert_eq!(m.date.as_deref(), Some("2025-01-01T00:00:00.000000000Z"));
    }

    #[test]
    fn test_parse_coinmetrics_numeric_values_and_missing_nupl() {
        let body = json!({"data": [{"asset": "btc", "time": "t", "CapMVRVCur": 1.9}]});
        let m = parse_coinmetrics(&body).unwrap();
        assert_eq!(m.mvrv, Some(1.9));
        assert_eq!(m.nupl, None);
    }

    #[test]
    fn test_parse_coinmetrics_rejects_missing_mvrv() {
        let body = json!({"data": [{"asset": "btc", "time": "t", "NUPLCur": "0.5"}]});
        assert!(parse_coinmetrics(&body).is_err());
        assert!(parse_coinmetrics(&json!({"data": []})).is_err());
        assert!(parse_coinmetrics(&json!({"error": {"type": "forbidden"}})).is_err());
    }

    #[test]
    fn test_metric_set_query() {
        assert_eq!(MetricSet::MvrvAndNupl.query(), "CapMVRVCur,NUPLCur");
        assert_eq!(MetricSet::MvrvOnly.query(), "CapMVRVCur");
    }
}
