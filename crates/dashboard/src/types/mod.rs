pub mod halving;
pub mod market_data;
pub mod signal;
pub mod snapshot;

pub use halving::HalvingInfo;
pub use market_data::{
    BlockHeight, FearGreedEntry, Granularity, HistoryHorizon, OnChainMetrics, PricePoint,
    PriceSeries, SpotPrice,
};
pub use signal::{Signal, SignalLevel, SignalSet};
pub use snapshot::{DashboardSnapshot, IndicatorValues};
