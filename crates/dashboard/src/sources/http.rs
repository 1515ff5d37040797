use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::DashboardError;

const USER_AGENT: &str = concat!("btc-dashboard/", env!("CARGO_PKG_VERSION"));

/// Thin wrapper around a shared [`reqwest::Client`].
///
/// Every request carries its own timeout (the provider's configured one), and
/// a non-2xx status is an error just like a transport failure.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
}

impl UpstreamClient {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client })
    }

    /// GET `url` with query `params` and parse the body as JSON.
    pub async fn get_json(
        &self,
        url: &str,
        params: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<Value> {
        let resp = self.send(url, params, timeout).await?;
        resp.json::<Value>()
            .await
            .with_context(|| format!("parse JSON from {url}"))
    }

    /// GET `url` and return the body as text.
    pub async fn get_text(&self, url: &str, timeout: Duration) -> Result<String> {
        let resp = self.send(url, &[], timeout).await?;
        resp.text()
            .await
            .with_context(|| format!("read body from {url}"))
    }

    async fn send(
        &self,
        url: &str,
        params: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<reqwest::Response> {
        debug!(url, ?params, timeout_ms = timeout.as_millis() as u64, "GET");

        let resp = self
            .client
            .get(url)
            .query(params)
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(timeout)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(url, %status, body = %truncate(&body, 200), "upstream returned non-success status");
            return Err(DashboardError::UpstreamStatus {
                url: url.to_string(),
                status: status.as_u16(),
            }
            .into());
        }

        Ok(resp)
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// ---------------------------------------------------------------------------
// JSON field helpers shared by the adapters
// ---------------------------------------------------------------------------

/// Read a number that upstreams send either as a JSON number or a string.
pub fn number_field(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|x| x.is_finite())
}

/// Like [`number_field`] but for integers (timestamps, index values).
pub fn integer_field(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_field_accepts_strings_and_numbers() {
        assert_eq!(number_field(&json!(1.5)), Some(1.5));
        assert_eq!(number_field(&json!("2.25")), Some(2.25));
        assert_eq!(number_field(&json!(" 3 ")), Some(3.0));
        assert_eq!(number_field(&json!("abc")), None);
        assert_eq!(number_field(&json!(null)), None);
        assert_eq!(number_field(&json!("NaN")), None);
    }

    #[test]
    fn test_integer_field() {
        assert_eq!(integer_field(&json!(1_700_000_000)), Some(1_700_000_000));
        assert_eq!(integer_field(&json!("1700000000")), Some(1_700_000_000));
        assert_eq!(integer_field(&json!([])), None);
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("hi", 10), "hi");
    }
}
