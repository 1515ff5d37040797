// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// Genesis block date (2009-01-03T00:00:00Z) as epoch milliseconds.
pub const GENESIS_TIMESTAMP_MS: i64 = 1_230_940_800_000;

pub const MS_PER_DAY: f64 = 86_400_000.0;

// ---------------------------------------------------------------------------
// Block schedule
// ---------------------------------------------------------------------------

pub const BLOCKS_PER_HALVING: u64 = 210_000;

/// Initial block subsidy in BTC.
pub const INITIAL_BLOCK_REWARD: f64 = 50.0;

/// Target block interval used for halving countdowns.
pub const MINUTES_PER_BLOCK: u64 = 10;

/// Average production rate used for the offline block-height estimate.
pub const BLOCKS_PER_DAY: f64 = 144.0;

/// Reported heights above this are treated as a malformed upstream answer.
pub const MAX_PLAUSIBLE_BLOCK_HEIGHT: u64 = 100_000_000;

// ---------------------------------------------------------------------------
// Moving-average windows
// ---------------------------------------------------------------------------

/// Window for the 200-day / 200-week moving averages and the Z-Score.
pub const MA_WINDOW: usize = 200;

/// Minimum daily points before MVRV may be approximated locally.
pub const MVRV_APPROX_MIN_POINTS: usize = 90;

/// Trailing window (days) used as the realized-price proxy.
pub const MVRV_APPROX_WINDOW: usize = 180;

// ---------------------------------------------------------------------------
// Power-law regressions
// ---------------------------------------------------------------------------

/// AHR999 trend: `10^(SLOPE × log10(days) + INTERCEPT)`.
pub const AHR999_POWER_LAW_SLOPE: f64 = 5.84;
pub const AHR999_POWER_LAW_INTERCEPT: f64 = -17.01;

/// Rainbow regression midline.
pub const RAINBOW_POWER_LAW_SLOPE: f64 = 5.84509;
pub const RAINBOW_POWER_LAW_INTERCEPT: f64 = -17.01593;

/// log10 offsets of the nine rainbow thresholds around the regression line,
/// cheapest band first. See DESIGN.md for why this table was chosen over the
/// other revisions.
pub const RAINBOW_OFFSETS: [f64; 9] = [-0.9, -0.55, -0.25, 0.05, 0.35, 0.6, 0.85, 1.1, 1.4];

// ---------------------------------------------------------------------------
// Price history acceptance
// ---------------------------------------------------------------------------

/// Downsampling stride turning daily points into weekly ones.
pub const DAYS_PER_WEEK: usize = 7;

/// Downsampled deep history must have more points than this.
pub const MIN_DOWNSAMPLED_WEEKLY_POINTS: usize = 200;

/// Native weekly candles must have more points than this.
pub const MIN_NATIVE_WEEKLY_POINTS: usize = 100;

/// Upper bound on candles requested from any history provider.
pub const MAX_HISTORY_POINTS: usize = 1000;

/// Daily history length used when `days` is missing or unusable.
pub const DEFAULT_DAILY_HISTORY_DAYS: usize = 365;

/// Fear & greed history window.
pub const FEAR_GREED_LIMIT: usize = 30;

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

pub const SOURCE_UNAVAILABLE: &str = "unavailable";
pub const SOURCE_FALLBACK: &str = "fallback";
pub const SOURCE_APPROXIMATION: &str = "approximation";
