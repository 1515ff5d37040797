use serde::Deserialize;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Top-level aggregate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    pub app: AppConfig,
    pub sources: SourcesConfig,
    pub refresh: RefreshConfig,
}

// ---------------------------------------------------------------------------
// app.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub log_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// `host:port` the HTTP surface listens on.
    pub bind_addr: String,
    pub cors_max_age_seconds: u64,
}

// ---------------------------------------------------------------------------
// sources.json
// ---------------------------------------------------------------------------

/// Ordered provider lists, one per feed. Order is fallback order.
#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    pub spot_price: Vec<ProviderConfig>,
    pub history: HistorySourcesConfig,
    pub fear_greed: Vec<ProviderConfig>,
    pub block_height: Vec<ProviderConfig>,
    pub onchain: Vec<ProviderConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistorySourcesConfig {
    /// Weekly candles over the full history.
    pub long_providers: Vec<ProviderConfig>,
    /// Daily candles over a bounded window.
    pub short_providers: Vec<ProviderConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub name: String,
    pub enabled: bool,
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// `base_url` joined with `path`, tolerating a trailing slash.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// Enabled providers of a feed, in configured order.
pub fn enabled(providers: &[ProviderConfig]) -> impl Iterator<Item = &ProviderConfig> {
    providers.iter().filter(|p| p.enabled)
}

// ---------------------------------------------------------------------------
// refresh.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshConfig {
    pub interval_seconds: u64,
    /// Daily candles requested for AHR999 and the MVRV approximation.
    pub daily_history_days: usize,
}

impl RefreshConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}
