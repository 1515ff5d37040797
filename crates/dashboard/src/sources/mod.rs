//! Upstream feed adapters.
//!
//! Each adapter walks its configured providers in order (see [`fallback`])
//! and normalizes whatever answers into the canonical types of
//! [`crate::types`]. A single upstream failure never escapes an adapter.

pub mod block_height;
pub mod fallback;
pub mod fear_greed;
pub mod http;
pub mod onchain;
pub mod price_history;
pub mod spot_price;

use anyhow::Result;

use crate::config::SourcesConfig;
use block_height::BlockHeightSource;
use fear_greed::FearGreedSource;
use http::UpstreamClient;
use onchain::OnChainSource;
use price_history::PriceHistorySource;
use spot_price::SpotPriceSource;

/// All feed adapters, sharing one HTTP client.
pub struct Sources {
    pub spot_price: SpotPriceSource,
    pub history: PriceHistorySource,
    pub fear_greed: FearGreedSource,
    pub block_height: BlockHeightSource,
    pub onchain: OnChainSource,
}

impl Sources {
    pub fn from_config(config: &SourcesConfig) -> Result<Self> {
        let http = UpstreamClient::new()?;

        Ok(Self {
            spot_price: SpotPriceSource::new(http.clone(), config.spot_price.clone()),
            history: PriceHistorySource::new(
                http.clone(),
                config.history.long_providers.clone(),
                config.history.short_providers.clone(),
            ),
            fear_greed: FearGreedSource::new(http.clone(), config.fear_greed.clone()),
            block_height: BlockHeightSource::new(http.clone(), config.block_height.clone()),
            onchain: OnChainSource::new(http, config.onchain.clone()),
        })
    }
}
