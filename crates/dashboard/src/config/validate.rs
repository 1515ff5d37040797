use std::net::SocketAddr;

use anyhow::{bail, Result};

use super::types::{DashboardConfig, ProviderConfig};
use crate::errors::DashboardError;

/// Provider names each feed knows how to talk to.
pub const SPOT_PRICE_PROVIDERS: &[&str] = &["coingecko", "coinbase", "kraken"];
pub const LONG_HISTORY_PROVIDERS: &[&str] = &["coingecko_daily", "binance_weekly", "kraken_weekly"];
pub const SHORT_HISTORY_PROVIDERS: &[&str] = &["binance_daily", "kraken_daily"];
pub const FEAR_GREED_PROVIDERS: &[&str] = &["alternative_me"];
pub const BLOCK_HEIGHT_PROVIDERS: &[&str] = &["blockchain_info"];
pub const ONCHAIN_PROVIDERS: &[&str] = &["coinmetrics"];

/// Upstream timeouts must stay within this envelope (seconds).
const MIN_TIMEOUT_SECONDS: u64 = 5;
const MAX_TIMEOUT_SECONDS: u64 = 15;

/// Validate invariants across the merged config that serde alone cannot enforce.
///
/// Called automatically by [`super::load_config`].
pub fn validate_config(config: &DashboardConfig) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();

    validate_server_config(config, &mut errors);
    validate_sources_config(config, &mut errors);
    validate_refresh_config(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        let msg = format!(
            "Configuration validation failed ({} error{}):\n  - {}",
            errors.len(),
            if errors.len() == 1 { "" } else { "s" },
            errors.join("\n  - ")
        );
        bail!(DashboardError::Config(msg));
    }
}

// ---------------------------------------------------------------------------
// Server / logging
// ---------------------------------------------------------------------------

fn validate_server_config(config: &DashboardConfig, errors: &mut Vec<String>) {
    let server = &config.app.server;

    if server.bind_addr.parse::<SocketAddr>().is_err() {
        errors.push(format!(
            "app.server.bind_addr: `{}` is not a valid socket address",
            server.bind_addr
        ));
    }

    if config.app.logging.log_dir.is_empty() {
        errors.push("app.logging.log_dir is empty".into());
    }
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

fn validate_sources_config(config: &DashboardConfig, errors: &mut Vec<String>) {
    let sources = &config.sources;

    let feeds: [(&str, &[ProviderConfig], &[&str]); 6] = [
        ("spot_price", &sources.spot_price, SPOT_PRICE_PROVIDERS),
        (
            "history.long_providers",
            &sources.history.long_providers,
            LONG_HISTORY_PROVIDERS,
        ),
        (
            "history.short_providers",
            &sources.history.short_providers,
            SHORT_HISTORY_PROVIDERS,
        ),
        ("fear_greed", &sources.fear_greed, FEAR_GREED_PROVIDERS),
        ("block_height", &sources.block_height, BLOCK_HEIGHT_PROVIDERS),
        ("onchain", &sources.onchain, ONCHAIN_PROVIDERS),
    ];

    for (feed, providers, known) in feeds {
        validate_provider_list(feed, providers, known, errors);
    }
}

fn validate_provider_list(
    feed: &str,
    providers: &[ProviderConfig],
    known: &[&str],
    errors: &mut Vec<String>,
) {
    if !providers.iter().any(|p| p.enabled) {
        errors.push(format!("sources.{feed}: at least one provider must be enabled"));
    }

    for (i, provider) in providers.iter().enumerate() {
        if !known.contains(&provider.name.as_str()) {
            errors.push(format!(
                "sources.{feed}[{i}]: {} (expected one of: {})",
                DashboardError::unknown_provider(feed, provider.name.as_str()),
                known.join(", ")
            ));
        }

        if !(provider.base_url.starts_with("http://") || provider.base_url.starts_with("https://"))
        {
            errors.push(format!(
                "sources.{feed}[{i}] ({}): base_url must be an http(s) URL",
                provider.name
            ));
        }

        if !(MIN_TIMEOUT_SECONDS..=MAX_TIMEOUT_SECONDS).contains(&provider.timeout_seconds) {
            errors.push(format!(
                "sources.{feed}[{i}] ({}): timeout_seconds must be in [{MIN_TIMEOUT_SECONDS}, {MAX_TIMEOUT_SECONDS}], got {}",
                provider.name, provider.timeout_seconds
            ));
        }
    }

    let mut seen: Vec<&str> = Vec::new();
    for provider in providers {
        if seen.contains(&provider.name.as_str()) {
            errors.push(format!(
                "sources.{feed}: provider `{}` listed more than once",
                provider.name
            ));
        }
        seen.push(&provider.name);
    }
}

// ---------------------------------------------------------------------------
// Refresh
// ---------------------------------------------------------------------------

fn validate_refresh_config(config: &DashboardConfig, errors: &mut Vec<String>) {
    let refresh = &config.refresh;

    if refresh.interval_seconds == 0 {
        errors.push("refresh.interval_seconds must be > 0".into());
    }

    if refresh.daily_history_days == 0 || refresh.daily_history_days > 1000 {
        errors.push(format!(
            "refresh.daily_history_days must be in [1, 1000], got {}",
            refresh.daily_history_days
        ));
    }
}
