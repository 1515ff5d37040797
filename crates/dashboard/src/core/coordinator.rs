//! Refresh orchestration and dashboard state.
//!
//! The [`Coordinator`] is the single writer of [`DashboardState`]. Each
//! refresh cycle fans out to the feed adapters, folds their results into the
//! state, fills on-chain gaps from price history and publishes an immutable
//! [`DashboardSnapshot`] on a `watch` channel for readers.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::RefreshConfig;
use crate::constants::{
    MVRV_APPROX_MIN_POINTS, MVRV_APPROX_WINDOW, SOURCE_APPROXIMATION, SOURCE_FALLBACK,
    SOURCE_UNAVAILABLE,
};
use crate::core::indicators;
use crate::core::signals;
use crate::errors::DashboardError;
use crate::sources::Sources;
use crate::types::{
    BlockHeight, DashboardSnapshot, FearGreedEntry, Granularity, HalvingInfo, HistoryHorizon,
    IndicatorValues, OnChainMetrics, PriceSeries, SignalSet,
};

// ═══════════════════════════════════════════════════════════════════════════
// DashboardState
// ═══════════════════════════════════════════════════════════════════════════

/// Mutable dashboard state. Only the coordinator writes it.
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub current_price: Option<f64>,
    pub price_source: String,
    pub last_price_update: Option<DateTime<Utc>>,

    pub weekly: PriceSeries,
    pub daily: PriceSeries,
    /// Set once both series have been obtained; history is not refetched
    /// afterwards.
    pub history_loaded: bool,

    pub fear_greed: Vec<FearGreedEntry>,
    pub on_chain: OnChainMetrics,

    pub block_height: Option<BlockHeight>,
    pub halving: Option<HalvingInfo>,

    pub last_full_update: Option<DateTime<Utc>>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            current_price: None,
            price_source: SOURCE_UNAVAILABLE.to_string(),
            last_price_update: None,
            weekly: PriceSeries::empty(Granularity::Weekly),
            daily: PriceSeries::empty(Granularity::Daily),
            history_loaded: false,
            fear_greed: Vec::new(),
            on_chain: OnChainMetrics::fallback(),
            block_height: None,
            halving: None,
            last_full_update: None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Coordinator
// ═══════════════════════════════════════════════════════════════════════════

pub struct Coordinator {
    sources: Arc<Sources>,
    state: DashboardState,
    daily_history_days: usize,
    interval: Duration,
    snapshot_tx: watch::Sender<Arc<DashboardSnapshot>>,
}

impl Coordinator {
    /// Create a coordinator and the receiver readers use to observe
    /// snapshots. The receiver starts with an all-gray snapshot.
    pub fn new(
        sources: Arc<Sources>,
        refresh: &RefreshConfig,
    ) -> (Self, watch::Receiver<Arc<DashboardSnapshot>>) {
        let state = DashboardState::default();
        let initial = Arc::new(build_snapshot(&state, Utc::now()));
        let (snapshot_tx, snapshot_rx) = watch::channel(initial);

        let coordinator = Self {
            sources,
            state,
            daily_history_days: refresh.daily_history_days,
            interval: refresh.interval(),
            snapshot_tx,
        };
        (coordinator, snapshot_rx)
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    /// Refresh immediately, then every configured interval until `shutdown`
    /// fires. Cycles never overlap.
    pub async fn run(mut self, shutdown: CancellationToken) -> Result<()> {
        info!(interval_secs = self.interval.as_secs(), "coordinator started");

        self.refresh().await;

        loop {
            tokio::select! {
                () = shutdown.cancelled() => {
                    info!("coordinator shutting down");
                    break;
                }
                () = tokio::time::sleep(self.interval) => {
                    self.refresh().await;
                }
            }
        }

        Ok(())
    }

    /// One full refresh cycle. Returns the snapshot that was published.
    pub async fn refresh(&mut self) -> Arc<DashboardSnapshot> {
        let started = std::time::Instant::now();
        let sources = Arc::clone(&self.sources);
        let fetch_history = !self.state.history_loaded;
        let daily_limit = self.daily_history_days;

        // 1 + 2: independent feeds and (first cycles only) history, concurrently.
        let history = async {
            if !fetch_history {
                return None;
            }
            let (weekly, daily) = tokio::join!(
                sources.history.fetch(HistoryHorizon::Long),
                sources.history.fetch(HistoryHorizon::Short { limit: daily_limit }),
            );
            Some((weekly, daily))
        };

        let (spot, fear_greed, block, history) = tokio::join!(
            sources.spot_price.fetch(),
            sources.fear_greed.fetch(),
            sources.block_height.fetch(),
            history,
        );

        // 3: fold results into state.
        let now = Utc::now();
        self.apply_spot_price(spot.price, spot.source, now);
        self.apply_fear_greed(fear_greed);
        self.apply_block_height(block, now);
        if let Some((weekly, daily)) = history {
            self.apply_history(weekly, daily);
        }

        // 4: on-chain strictly after price and history are in place.
        let on_chain = sources.onchain.fetch().await;
        self.state.on_chain =
            fill_on_chain_gaps(on_chain, self.state.current_price, &self.state.daily);

        // 5: derive and publish.
        let now = Utc::now();
        self.state.last_full_update = Some(now);
        let snapshot = Arc::new(build_snapshot(&self.state, now));
        self.snapshot_tx.send_replace(Arc::clone(&snapshot));

        info!(
            price = ?snapshot.current_price,
            price_source = %snapshot.price_source,
            ahr999 = ?snapshot.indicators.ahr999,
            z_score = ?snapshot.indicators.z_score,
            mvrv = ?snapshot.on_chain.mvrv,
            overall_risk = ?snapshot.overall_risk,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "refresh cycle complete"
        );

        snapshot
    }

    // -----------------------------------------------------------------------
    // State updates
    // -----------------------------------------------------------------------

    /// The adapter's answer replaces the current price, including an
    /// unavailable one.
    fn apply_spot_price(&mut self, price: Option<f64>, source: String, now: DateTime<Utc>) {
        if price.is_none() {
            warn!(previous = ?self.state.current_price, "spot price unavailable");
        }
        self.state.current_price = price;
        self.state.price_source = source;
        self.state.last_price_update = Some(now);
    }

    /// An empty result keeps the previous history.
    fn apply_fear_greed(&mut self, entries: Vec<FearGreedEntry>) {
        if entries.is_empty() {
            debug!("fear & greed empty, keeping previous entries");
            return;
        }
        self.state.fear_greed = entries;
    }

    fn apply_block_height(&mut self, block: BlockHeight, now: DateTime<Utc>) {
        self.state.halving = Some(indicators::halving_info(block.height, now));
        self.state.block_height = Some(block);
    }

    /// A failed series keeps whatever was cached before and is retried next
    /// cycle; `history_loaded` is set only once both are present.
    fn apply_history(
        &mut self,
        weekly: Result<PriceSeries, DashboardError>,
        daily: Result<PriceSeries, DashboardError>,
    ) {
        let mut complete = true;

        match weekly {
            Ok(series) => self.state.weekly = series,
            Err(e) => {
                warn!(error = %e, "weekly history unavailable");
                complete = false;
            }
        }

        match daily {
            Ok(series) => self.state.daily = series,
            Err(e) => {
                warn!(error = %e, "daily history unavailable");
                complete = false;
            }
        }

        self.state.history_loaded = complete;
        debug!(
            weekly = self.state.weekly.len(),
            daily = self.state.daily.len(),
            history_loaded = complete,
            "history applied"
        );
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// On-chain approximation
// ═══════════════════════════════════════════════════════════════════════════

/// `price / mean(last min(180, n) daily closes)`, rounded to 3 decimals.
///
/// Needs a positive price and at least 90 daily points.
pub fn approximate_mvrv(current_price: Option<f64>, daily: &PriceSeries) -> Option<f64> {
    let price = current_price.filter(|p| p.is_finite() && *p > 0.0)?;
    if daily.len() < MVRV_APPROX_MIN_POINTS {
        return None;
    }
    let window = daily.len().min(MVRV_APPROX_WINDOW);
    let realized_proxy = indicators::simple_moving_average(daily, window)?;
    if realized_proxy <= 0.0 {
        return None;
    }
    Some(round3(price / realized_proxy))
}

/// `(mvrv − 1) / mvrv`, rounded to 3 decimals. Needs `mvrv > 0`.
pub fn approximate_nupl(mvrv: Option<f64>) -> Option<f64> {
    let mvrv = mvrv.filter(|m| m.is_finite() && *m > 0.0)?;
    Some(round3((mvrv - 1.0) / mvrv))
}

/// Fill a missing MVRV from price history and a missing NUPL from MVRV.
///
/// Applying it twice to the same inputs yields the same result. The source is
/// tagged `approximation` (nothing came from upstream) or
/// `<upstream>+approximation`.
pub fn fill_on_chain_gaps(
    mut metrics: OnChainMetrics,
    current_price: Option<f64>,
    daily: &PriceSeries,
) -> OnChainMetrics {
    let mut approximated = false;

    if metrics.mvrv.is_none() {
        metrics.mvrv = approximate_mvrv(current_price, daily);
        approximated |= metrics.mvrv.is_some();
    }

    if metrics.nupl.is_none() {
        metrics.nupl = approximate_nupl(metrics.mvrv);
        approximated |= metrics.nupl.is_some();
    }

    if approximated {
        metrics.source = match metrics.source.as_str() {
            SOURCE_FALLBACK | SOURCE_APPROXIMATION => SOURCE_APPROXIMATION.to_string(),
            upstream => format!("{upstream}+{SOURCE_APPROXIMATION}"),
        };
        debug!(
            mvrv = ?metrics.mvrv,
            nupl = ?metrics.nupl,
            source = %metrics.source,
            "on-chain gaps approximated"
        );
    }

    metrics
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

// ═══════════════════════════════════════════════════════════════════════════
// Snapshot
// ═══════════════════════════════════════════════════════════════════════════

/// Derive indicators and signals from `state` as of `now`.
pub fn build_snapshot(state: &DashboardState, now: DateTime<Utc>) -> DashboardSnapshot {
    let days = indicators::days_since_genesis(now);
    let price = state.current_price;

    let ma_200_week = indicators::ma_200(&state.weekly);
    let values = IndicatorValues {
        ma_200_week,
        ahr999: indicators::ahr999(price, &state.daily, days),
        z_score: indicators::z_score(price, &state.weekly),
        rainbow_band: indicators::rainbow_band_index(price, days),
        days_since_genesis: days,
    };

    let fear_greed_value = state.fear_greed.first().map(|e| e.value);

    let signals = SignalSet {
        ahr999: signals::ahr999_signal(values.ahr999),
        mvrv: signals::mvrv_signal(state.on_chain.mvrv),
        ma_200_week: signals::ma_200_week_signal(price, ma_200_week),
        fear_greed: signals::fear_greed_signal(fear_greed_value),
        nupl: signals::nupl_signal(state.on_chain.nupl),
        z_score: signals::z_score_signal(values.z_score),
    };
    let overall_risk = signals::overall_risk(&signals.levels());

    DashboardSnapshot {
        current_price: price,
        price_source: state.price_source.clone(),
        last_price_update: state.last_price_update,
        weekly_points: state.weekly.len(),
        daily_points: state.daily.len(),
        history_loaded: state.history_loaded,
        fear_greed_value,
        fear_greed_history: state.fear_greed.clone(),
        on_chain: state.on_chain.clone(),
        halving: state.halving.clone(),
        block_height_approximate: state.block_height.is_some_and(|b| b.approximate),
        indicators: values,
        signals,
        overall_risk,
        last_full_update: state.last_full_update,
    }
}
