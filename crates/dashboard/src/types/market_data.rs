use std::fmt;

use serde::{Deserialize, Serialize};

/// A single close price at an epoch-millisecond timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: i64,
    pub price: f64,
}

impl PricePoint {
    pub fn new(timestamp: i64, price: f64) -> Self {
        Self { timestamp, price }
    }
}

/// Candle spacing of a [`PriceSeries`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Daily,
    Weekly,
}

/// Ascending, duplicate-free close-price series of a single granularity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub granularity: Granularity,
    pub points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series from raw `(timestamp_ms, close)` pairs.
    ///
    /// Sorts ascending, keeps the first point for a repeated timestamp and
    /// drops non-finite or non-positive closes.
    pub fn from_pairs(granularity: Granularity, pairs: impl IntoIterator<Item = (i64, f64)>) -> Self {
        let mut points: Vec<PricePoint> = pairs
            .into_iter()
            .filter(|(_, price)| price.is_finite() && *price > 0.0)
            .map(|(ts, price)| PricePoint::new(ts, price))
            .collect();
        points.sort_by_key(|p| p.timestamp);
        points.dedup_by_key(|p| p.timestamp);
        Self { granularity, points }
    }

    pub fn empty(granularity: Granularity) -> Self {
        Self {
            granularity,
            points: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn prices(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.price)
    }

    /// Keep every `stride`-th point starting from the oldest one.
    pub fn downsample(&self, stride: usize, granularity: Granularity) -> Self {
        let stride = stride.max(1);
        Self {
            granularity,
            points: self.points.iter().step_by(stride).copied().collect(),
        }
    }

    /// Keep only the most recent `limit` points.
    pub fn keep_last(mut self, limit: usize) -> Self {
        if self.points.len() > limit {
            self.points.drain(..self.points.len() - limit);
        }
        self
    }

    /// `[[timestamp_ms, close], …]` pairs as served by `/history`.
    pub fn to_pairs(&self) -> Vec<(i64, f64)> {
        self.points.iter().map(|p| (p.timestamp, p.price)).collect()
    }
}

/// Which history path a caller wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "horizon")]
pub enum HistoryHorizon {
    /// Weekly candles over the full history (200-week MA, Z-Score, rainbow).
    Long,
    /// Daily candles, most recent `limit` days (AHR999, MVRV approximation).
    Short { limit: usize },
}

impl HistoryHorizon {
    pub fn granularity(&self) -> Granularity {
        match self {
            Self::Long => Granularity::Weekly,
            Self::Short { .. } => Granularity::Daily,
        }
    }
}

impl fmt::Display for HistoryHorizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Long => write!(f, "long"),
            Self::Short { limit } => write!(f, "short, {limit} days"),
        }
    }
}

/// Latest spot price and the provider that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotPrice {
    pub price: Option<f64>,
    pub source: String,
}

impl SpotPrice {
    pub fn unavailable() -> Self {
        Self {
            price: None,
            source: crate::constants::SOURCE_UNAVAILABLE.to_string(),
        }
    }
}

/// One fear & greed index reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FearGreedEntry {
    pub value: u32,
    pub classification: String,
    pub timestamp_ms: i64,
}

/// Chain tip height, flagged when it was estimated rather than fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeight {
    pub height: u64,
    pub approximate: bool,
}

/// MVRV / NUPL reading plus the upstream (or approximation) that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnChainMetrics {
    pub mvrv: Option<f64>,
    pub nupl: Option<f64>,
    pub date: Option<String>,
    pub source: String,
}

impl OnChainMetrics {
    pub fn fallback() -> Self {
        Self {
            mvrv: None,
            nupl: None,
            date: None,
            source: crate::constants::SOURCE_FALLBACK.to_string(),
        }
    }
}
