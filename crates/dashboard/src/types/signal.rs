use serde::{Deserialize, Serialize};

/// Discrete risk level of a valuation signal.
///
/// Declaration order is severity order, so `Ord` ranks
/// gray < green < yellow < orange < red.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalLevel {
    /// Indicator not yet computable. Never produced from a numeric value.
    Gray,
    Green,
    Yellow,
    Orange,
    Red,
}

/// Classified indicator reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    pub level: SignalLevel,
    pub label: String,
    pub description: String,
}

impl Signal {
    pub fn new(level: SignalLevel, label: &str, description: &str) -> Self {
        Self {
            level,
            label: label.to_string(),
            description: description.to_string(),
        }
    }

    /// The level, or `None` while the indicator is still gray.
    pub fn known_level(&self) -> Option<SignalLevel> {
        match self.level {
            SignalLevel::Gray => None,
            level => Some(level),
        }
    }
}

/// The six dashboard signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSet {
    pub ahr999: Signal,
    pub mvrv: Signal,
    pub ma_200_week: Signal,
    pub fear_greed: Signal,
    pub nupl: Signal,
    pub z_score: Signal,
}

impl SignalSet {
    pub fn levels(&self) -> [Option<SignalLevel>; 6] {
        [
            self.ahr999.known_level(),
            self.mvrv.known_level(),
            self.ma_200_week.known_level(),
            self.fear_greed.known_level(),
            self.nupl.known_level(),
            self.z_score.known_level(),
        ]
    }
}
