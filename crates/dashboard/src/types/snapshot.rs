use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::halving::HalvingInfo;
use super::market_data::{FearGreedEntry, OnChainMetrics};
use super::signal::{SignalLevel, SignalSet};

/// Indicator values computed from one refresh cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorValues {
    pub ma_200_week: Option<f64>,
    pub ahr999: Option<f64>,
    pub z_score: Option<f64>,
    /// Rainbow band index in `[0, 8]`, cheapest band first.
    pub rainbow_band: Option<usize>,
    pub days_since_genesis: f64,
}

/// Immutable dashboard view published after every refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub current_price: Option<f64>,
    pub price_source: String,
    pub last_price_update: Option<DateTime<Utc>>,

    pub weekly_points: usize,
    pub daily_points: usize,
    pub history_loaded: bool,

    pub fear_greed_value: Option<u32>,
    pub fear_greed_history: Vec<FearGreedEntry>,

    pub on_chain: OnChainMetrics,

    pub halving: Option<HalvingInfo>,
    pub block_height_approximate: bool,

    pub indicators: IndicatorValues,
    pub signals: SignalSet,
    pub overall_risk: SignalLevel,

    pub last_full_update: Option<DateTime<Utc>>,
}
