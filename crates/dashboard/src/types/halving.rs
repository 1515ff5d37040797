use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Halving countdown derived from the current block height.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HalvingInfo {
    /// Number of halvings that have already happened.
    pub halving_number: u32,
    pub current_block: u64,
    pub next_halving_block: u64,
    pub blocks_remaining: u64,
    pub estimated_date: DateTime<Utc>,
    /// Block subsidy in BTC for the current epoch.
    pub current_reward: f64,
    pub next_reward: f64,
    pub days_remaining: u64,
    pub hours_remaining: u64,
    pub minutes_remaining: u64,
}
