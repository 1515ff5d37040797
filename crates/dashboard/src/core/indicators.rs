//! Pure computation module for the valuation indicators.
//!
//! No I/O, no side effects. Takes normalized price series and returns
//! indicator values. Every function is total: when its input constraints are
//! not met (series too short, price missing or non-positive) it returns
//! `None` rather than a misleading default.
//!
//! Indicators implemented:
//! - 200-day / 200-week simple moving average
//! - AHR999 (price vs 200-day MA × price vs power-law trend)
//! - Z-Score against the 200-week MA (population standard deviation)
//! - Power-law rainbow bands and band index
//! - Halving schedule

use chrono::{DateTime, Duration, Utc};

use crate::constants::{
    AHR999_POWER_LAW_INTERCEPT, AHR999_POWER_LAW_SLOPE, BLOCKS_PER_HALVING, GENESIS_TIMESTAMP_MS,
    INITIAL_BLOCK_REWARD, MA_WINDOW, MINUTES_PER_BLOCK, MS_PER_DAY, RAINBOW_OFFSETS,
    RAINBOW_POWER_LAW_INTERCEPT, RAINBOW_POWER_LAW_SLOPE,
};
use crate::types::{HalvingInfo, PriceSeries};

// ═══════════════════════════════════════════════════════════════════════════
// Time
// ═══════════════════════════════════════════════════════════════════════════

/// Fractional days elapsed between the genesis date and `now`.
pub fn days_since_genesis(now: DateTime<Utc>) -> f64 {
    (now.timestamp_millis() - GENESIS_TIMESTAMP_MS) as f64 / MS_PER_DAY
}

// ═══════════════════════════════════════════════════════════════════════════
// Moving averages
// ═══════════════════════════════════════════════════════════════════════════

/// Arithmetic mean of the most recent `window` prices.
///
/// Returns `None` if the series is shorter than `window` or `window == 0`.
pub fn simple_moving_average(series: &PriceSeries, window: usize) -> Option<f64> {
    let tail = trailing_prices(series, window)?;
    Some(mean(tail))
}

/// 200-period SMA of whichever series is passed (200-day or 200-week).
pub fn ma_200(series: &PriceSeries) -> Option<f64> {
    simple_moving_average(series, MA_WINDOW)
}

fn trailing_prices(series: &PriceSeries, window: usize) -> Option<Vec<f64>> {
    if window == 0 || series.len() < window {
        return None;
    }
    Some(series.points[series.len() - window..].iter().map(|p| p.price).collect())
}

fn mean(values: Vec<f64>) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

// ═══════════════════════════════════════════════════════════════════════════
// AHR999
// ═══════════════════════════════════════════════════════════════════════════

/// Long-term power-law price estimate: `10^(5.84 × log10(days) − 17.01)`.
pub fn power_law_estimate(days_since_genesis: f64) -> Option<f64> {
    if !days_since_genesis.is_finite() || days_since_genesis <= 0.0 {
        return None;
    }
    let exponent = AHR999_POWER_LAW_SLOPE * days_since_genesis.log10() + AHR999_POWER_LAW_INTERCEPT;
    Some(10f64.powf(exponent))
}

/// AHR999 = `(price / MA200day) × (price / power_law_estimate(days))`.
///
/// Product of the short-term deviation from the 200-day MA and the long-term
/// deviation from the power-law trend. Needs a positive price and ≥200 daily
/// points.
pub fn ahr999(
    current_price: Option<f64>,
    daily: &PriceSeries,
    days_since_genesis: f64,
) -> Option<f64> {
    let price = positive(current_price)?;
    let ma = ma_200(daily).filter(|ma| *ma > 0.0)?;
    let trend = power_law_estimate(days_since_genesis).filter(|t| *t > 0.0)?;
    Some((price / ma) * (price / trend))
}

// ═══════════════════════════════════════════════════════════════════════════
// Z-Score
// ═══════════════════════════════════════════════════════════════════════════

/// `(price − MA200week) / σ` over the last 200 weekly closes.
///
/// σ is the population standard deviation; a flat window (σ = 0) yields
/// exactly `0.0`.
pub fn z_score(current_price: Option<f64>, weekly: &PriceSeries) -> Option<f64> {
    let price = positive(current_price)?;
    let window = trailing_prices(weekly, MA_WINDOW)?;
    let n = window.len() as f64;
    let ma = window.iter().sum::<f64>() / n;
    let variance = window.iter().map(|p| (p - ma).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    if std_dev == 0.0 {
        return Some(0.0);
    }
    Some((price - ma) / std_dev)
}

// ═══════════════════════════════════════════════════════════════════════════
// Rainbow bands
// ═══════════════════════════════════════════════════════════════════════════

/// Nine price thresholds of the rainbow chart for `days_since_genesis`,
/// cheapest first, using [`RAINBOW_OFFSETS`].
pub fn rainbow_bands(days_since_genesis: f64) -> Option<[f64; 9]> {
    rainbow_bands_with(days_since_genesis, &RAINBOW_OFFSETS)
}

/// Rainbow thresholds for an alternative offset table.
///
/// `base = 5.84509 × log10(days) − 17.01593`; band `i` sits at
/// `10^(base + offsets[i])`.
pub fn rainbow_bands_with(days_since_genesis: f64, offsets: &[f64; 9]) -> Option<[f64; 9]> {
    if !days_since_genesis.is_finite() || days_since_genesis <= 0.0 {
        return None;
    }
    let base = RAINBOW_POWER_LAW_SLOPE * days_since_genesis.log10() + RAINBOW_POWER_LAW_INTERCEPT;
    Some(offsets.map(|offset| 10f64.powf(base + offset)))
}

/// Index of the rainbow band containing `price`.
///
/// Linear scan: band `i` spans up to threshold `i + 1`; prices above every
/// threshold land in the last band. Always within `[0, 8]`.
pub fn rainbow_band_index(current_price: Option<f64>, days_since_genesis: f64) -> Option<usize> {
    let price = positive(current_price)?;
    let bands = rainbow_bands(days_since_genesis)?;
    Some(band_index(price, &bands))
}

fn band_index(price: f64, bands: &[f64; 9]) -> usize {
    for i in 0..bands.len() - 1 {
        if price <= bands[i + 1] {
            return i;
        }
    }
    bands.len() - 1
}

// ═══════════════════════════════════════════════════════════════════════════
// Halving schedule
// ═══════════════════════════════════════════════════════════════════════════

/// Halving countdown for `current_block`, timed from `now` at exactly ten
/// minutes per block.
pub fn halving_info(current_block: u64, now: DateTime<Utc>) -> HalvingInfo {
    let halving_number = current_block / BLOCKS_PER_HALVING;
    let next_halving_block = halving_number
        .saturating_add(1)
        .saturating_mul(BLOCKS_PER_HALVING);
    let blocks_remaining = next_halving_block.saturating_sub(current_block);

    let total_minutes = blocks_remaining.saturating_mul(MINUTES_PER_BLOCK);
    let estimated_date = i64::try_from(total_minutes)
        .ok()
        .and_then(Duration::try_minutes)
        .and_then(|remaining| now.checked_add_signed(remaining))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);

    // Subsidy reaches zero after 64 halvings; powi saturates gracefully.
    let exponent = i32::try_from(halving_number).unwrap_or(i32::MAX);
    let current_reward = INITIAL_BLOCK_REWARD / 2f64.powi(exponent);

    HalvingInfo {
        halving_number: u32::try_from(halving_number).unwrap_or(u32::MAX),
        current_block,
        next_halving_block,
        blocks_remaining,
        estimated_date,
        current_reward,
        next_reward: current_reward / 2.0,
        days_remaining: total_minutes / (60 * 24),
        hours_remaining: (total_minutes % (60 * 24)) / 60,
        minutes_remaining: total_minutes % 60,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════════════

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}
