//! Threshold classification of indicator values into risk signals.
//!
//! Each indicator has an ordered band table checked top to bottom; the first
//! band whose bound admits the value wins and the last band is a catch-all.
//! A missing value is always gray.

use crate::types::{Signal, SignalLevel};

const LOADING_LABEL: &str = "Loading";

/// Upper bound of a band.
#[derive(Debug, Clone, Copy)]
enum Bound {
    /// `value < x`
    Below(f64),
    /// `value <= x`
    AtMost(f64),
    Otherwise,
}

impl Bound {
    fn admits(self, value: f64) -> bool {
        match self {
            Self::Below(x) => value < x,
            Self::AtMost(x) => value <= x,
            Self::Otherwise => true,
        }
    }
}

struct Band {
    bound: Bound,
    level: SignalLevel,
    label: &'static str,
    description: &'static str,
}

const fn band(
    bound: Bound,
    level: SignalLevel,
    label: &'static str,
    description: &'static str,
) -> Band {
    Band {
        bound,
        level,
        label,
        description,
    }
}

use Bound::{AtMost, Below, Otherwise};
use SignalLevel::{Green, Orange, Red, Yellow};

// ═══════════════════════════════════════════════════════════════════════════
// Band tables
// ═══════════════════════════════════════════════════════════════════════════

const AHR999_BANDS: [Band; 4] = [
    band(Below(0.45), Green, "Bottom zone", "Strong buy signal, historical cycle bottom"),
    band(Below(1.2), Yellow, "Accumulation zone", "Suitable for dollar-cost averaging, risk contained"),
    band(Below(2.0), Orange, "Expensive", "Market running hot, add with caution"),
    band(Otherwise, Red, "High risk", "Valuation stretched, consider taking profit in tranches"),
];

const MVRV_BANDS: [Band; 5] = [
    band(Below(1.0), Green, "Deeply undervalued", "Market cap below realized cap, historical bottom"),
    band(Below(2.0), Green, "Undervalued", "Still within a reasonable undervalued range"),
    band(Below(3.5), Yellow, "Fair value", "Market neutral, watch the trend"),
    band(Below(5.0), Orange, "Expensive", "Market running hot, mind the risk"),
    band(Otherwise, Red, "Extremely overvalued", "Historical top zone, hold with caution"),
];

const MA_200_WEEK_BANDS: [Band; 5] = [
    band(Below(1.0), Green, "Below MA", "Rare bottom opportunity, historically the strongest buy"),
    band(Below(1.2), Green, "Near MA", "Support zone, historical buying opportunity"),
    band(Below(2.0), Yellow, "Normal range", "Above the MA but within the usual range"),
    band(Below(3.5), Orange, "Elevated", "Well above the MA, avoid chasing"),
    band(Otherwise, Red, "Extremely elevated", "Far above the MA, typical of cycle tops"),
];

const FEAR_GREED_BANDS: [Band; 5] = [
    band(AtMost(20.0), Green, "Extreme fear", "Historically the best time to buy"),
    band(AtMost(40.0), Green, "Fear", "Sentiment depressed, consider building a position"),
    band(AtMost(60.0), Yellow, "Neutral", "Sentiment neutral, observe"),
    band(AtMost(80.0), Orange, "Greed", "Market optimistic, mind the risk"),
    band(Otherwise, Red, "Extreme greed", "Common near cycle tops, avoid chasing"),
];

const NUPL_BANDS: [Band; 5] = [
    band(Below(0.0), Green, "Capitulation", "Most holders at a loss, historical bottom"),
    band(Below(0.25), Green, "Hope / fear", "Market slowly recovering from the bottom"),
    band(Below(0.5), Yellow, "Optimism", "Most holders in profit, healthy market"),
    band(Below(0.75), Orange, "Belief", "Large unrealized profit, beware of excess greed"),
    band(Otherwise, Red, "Euphoria", "Typical of cycle tops, strongly consider taking profit"),
];

const Z_SCORE_BANDS: [Band; 4] = [
    band(Below(0.0), Green, "Below mean", "Price below the 200-week MA, historical bottom"),
    band(Below(3.0), Yellow, "Normal range", "Small deviation, healthy market"),
    band(Below(6.0), Orange, "Elevated", "Above the normal valuation range"),
    band(Otherwise, Red, "Extremely elevated", "Seen only a few times, close to a cycle top"),
];

// ═══════════════════════════════════════════════════════════════════════════
// Classifiers
// ═══════════════════════════════════════════════════════════════════════════

fn classify(value: Option<f64>, bands: &[Band], loading: &str) -> Signal {
    let Some(value) = value.filter(|v| !v.is_nan()) else {
        return Signal::new(SignalLevel::Gray, LOADING_LABEL, loading);
    };

    bands
        .iter()
        .find(|b| b.bound.admits(value))
        .map(|b| Signal::new(b.level, b.label, b.description))
        .unwrap_or_else(|| Signal::new(SignalLevel::Gray, LOADING_LABEL, loading))
}

pub fn ahr999_signal(value: Option<f64>) -> Signal {
    classify(value, &AHR999_BANDS, "Fetching data...")
}

pub fn mvrv_signal(value: Option<f64>) -> Signal {
    classify(value, &MVRV_BANDS, "Fetching data...")
}

/// Classifies `price / ma`; gray when either is missing or zero.
pub fn ma_200_week_signal(current_price: Option<f64>, ma: Option<f64>) -> Signal {
    let ratio = match (current_price, ma) {
        (Some(price), Some(ma)) if price != 0.0 && ma != 0.0 => Some(price / ma),
        _ => None,
    };
    classify(ratio, &MA_200_WEEK_BANDS, "Computing moving average...")
}

pub fn fear_greed_signal(value: Option<u32>) -> Signal {
    classify(value.map(f64::from), &FEAR_GREED_BANDS, "Fetching index...")
}

pub fn nupl_signal(value: Option<f64>) -> Signal {
    classify(value, &NUPL_BANDS, "Fetching data...")
}

pub fn z_score_signal(value: Option<f64>) -> Signal {
    classify(value, &Z_SCORE_BANDS, "Computing Z-Score...")
}

// ═══════════════════════════════════════════════════════════════════════════
// Aggregation
// ═══════════════════════════════════════════════════════════════════════════

/// Combine individual signal levels into one overall level.
///
/// Missing levels are ignored. Rules, first match wins: no levels → gray;
/// ≥3 red → red; ≥2 red or ≥3 orange → orange; ≥4 green → green; ≥3 green →
/// yellow; otherwise the most severe level present.
pub fn overall_risk(levels: &[Option<SignalLevel>]) -> SignalLevel {
    let present: Vec<SignalLevel> = levels.iter().flatten().copied().collect();

    let count = |level: SignalLevel| present.iter().filter(|l| **l == level).count();
    let reds = count(Red);
    let oranges = count(Orange);
    let greens = count(Green);

    match present.iter().max() {
        None => SignalLevel::Gray,
        Some(_) if reds >= 3 => Red,
        Some(_) if reds >= 2 || oranges >= 3 => Orange,
        Some(_) if greens >= 4 => Green,
        Some(_) if greens >= 3 => Yellow,
        Some(highest) => *highest,
    }
}
