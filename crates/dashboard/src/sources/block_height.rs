use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::fallback::{first_available, Attempt};
use super::http::UpstreamClient;
use crate::config::{enabled, ProviderConfig};
use crate::constants::{BLOCKS_PER_DAY, MAX_PLAUSIBLE_BLOCK_HEIGHT};
use crate::core::indicators::days_since_genesis;
use crate::errors::DashboardError;
use crate::types::BlockHeight;

const FEED: &str = "block_height";

/// Current chain tip height.
pub struct BlockHeightSource {
    http: UpstreamClient,
    providers: Vec<ProviderConfig>,
}

impl BlockHeightSource {
    pub fn new(http: UpstreamClient, providers: Vec<ProviderConfig>) -> Self {
        Self { http, providers }
    }

    /// Never fails: exhaustion yields an estimate from elapsed time, flagged
    /// `approximate`.
    pub async fn fetch(&self) -> BlockHeight {
        let attempts = enabled(&self.providers)
            .map(|p| Attempt::new(p.name.as_str(), self.query_provider(p)))
            .collect();

        match first_available(FEED, attempts).await {
            Some(sourced) => {
                debug!(height = sourced.value, source = %sourced.provider, "block height fetched");
                BlockHeight {
                    height: sourced.value,
                    approximate: false,
                }
            }
            None => {
                let estimate = estimate_block_height(Utc::now());
                warn!(height = estimate.height, "using estimated block height");
                estimate
            }
        }
    }

    async fn query_provider(&self, provider: &ProviderConfig) -> Result<u64> {
        match provider.name.as_str() {
            "blockchain_info" => {
                let body = self
                    .http
                    .get_text(&provider.url("/q/getblockcount"), provider.timeout())
                    .await?;
                parse_block_count(&body)
            }
            other => bail!(DashboardError::unknown_provider(FEED, other)),
        }
    }
}

/// Plain-text decimal block count, at most [`MAX_PLAUSIBLE_BLOCK_HEIGHT`].
pub fn parse_block_count(body: &str) -> Result<u64> {
    let height = body
        .trim()
        .parse::<u64>()
        .with_context(|| format!("invalid block count: {:?}", body.trim()))?;
    if height > MAX_PLAUSIBLE_BLOCK_HEIGHT {
        bail!("implausible block count: {height}");
    }
    Ok(height)
}

/// `floor(days_since_genesis × 144)`, flagged approximate.
pub fn estimate_block_height(now: DateTime<Utc>) -> BlockHeight {
    let days = days_since_genesis(now).max(0.0);
    BlockHeight {
        height: (days * BLOCKS_PER_DAY).floor() as u64,
        approximate: true,
    }
}
