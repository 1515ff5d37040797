use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::AppState;
use crate::constants::{DEFAULT_DAILY_HISTORY_DAYS, MAX_HISTORY_POINTS};
use crate::types::{
    BlockHeight, DashboardSnapshot, FearGreedEntry, HistoryHorizon, OnChainMetrics, SpotPrice,
};

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub days: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub prices: Vec<(i64, f64)>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Fear & greed entries are served in the upstream's string form.
#[derive(Debug, Serialize, Deserialize)]
pub struct FearGreedResponse {
    pub data: Vec<FearGreedWire>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FearGreedWire {
    pub value: String,
    pub value_classification: String,
    /// Epoch seconds.
    pub timestamp: String,
}

impl From<&FearGreedEntry> for FearGreedWire {
    fn from(entry: &FearGreedEntry) -> Self {
        Self {
            value: entry.value.to_string(),
            value_classification: entry.classification.clone(),
            timestamp: (entry.timestamp_ms / 1000).to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HalvingResponse {
    pub block_height: u64,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub approximate: bool,
}

impl From<BlockHeight> for HalvingResponse {
    fn from(block: BlockHeight) -> Self {
        Self {
            block_height: block.height,
            approximate: block.approximate,
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub async fn price(State(state): State<AppState>) -> Json<SpotPrice> {
    Json(state.sources.spot_price.fetch().await)
}

pub async fn history(State(state): State<AppState>, Query(query): Query<HistoryQuery>) -> Response {
    let horizon = parse_history_days(query.days.as_deref());
    debug!(days = ?query.days, %horizon, "history request");

    match state.sources.history.fetch(horizon).await {
        Ok(series) => Json(HistoryResponse {
            prices: series.to_pairs(),
        })
        .into_response(),
        Err(e) => {
            warn!(error = %e, "history request failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

pub async fn fear_greed(State(state): State<AppState>) -> Json<FearGreedResponse> {
    let entries = state.sources.fear_greed.fetch().await;
    Json(FearGreedResponse {
        data: entries.iter().map(FearGreedWire::from).collect(),
    })
}

pub async fn halving(State(state): State<AppState>) -> Json<HalvingResponse> {
    Json(state.sources.block_height.fetch().await.into())
}

pub async fn onchain_metrics(State(state): State<AppState>) -> Json<OnChainMetrics> {
    Json(state.sources.onchain.fetch().await)
}

pub async fn dashboard(State(state): State<AppState>) -> Json<DashboardSnapshot> {
    let snapshot: Arc<DashboardSnapshot> = state.snapshot.borrow().clone();
    Json(snapshot.as_ref().clone())
}

// ---------------------------------------------------------------------------
// Query parsing
// ---------------------------------------------------------------------------

/// Map the `days` query parameter to a history horizon.
///
/// Missing or `max` → long; an integer above 365 → long; 1..=365 → that many
/// daily candles; anything else → 365 daily candles.
pub fn parse_history_days(days: Option<&str>) -> HistoryHorizon {
    let days = match days.map(str::trim) {
        None | Some("max") => return HistoryHorizon::Long,
        Some(raw) => raw.parse::<i64>().ok(),
    };

    match days {
        Some(n) if n > DEFAULT_DAILY_HISTORY_DAYS as i64 => HistoryHorizon::Long,
        Some(n) if n >= 1 => HistoryHorizon::Short {
            limit: (n as usize).min(MAX_HISTORY_POINTS),
        },
        _ => HistoryHorizon::Short {
            limit: DEFAULT_DAILY_HISTORY_DAYS,
        },
    }
}
