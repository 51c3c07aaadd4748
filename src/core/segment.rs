use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A fixed-length, normalized window of one series' moving average.
///
/// `vector` always has the configured output length and `volatility` (its
/// population standard deviation) lies inside the volatility gate the segment
/// was built with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Series identifier (ticker).
    pub series_id: String,
    /// Date of the first sample in the window.
    pub window_start: NaiveDate,
    /// Date of the last sample in the window.
    pub window_end: NaiveDate,
    /// Series kind, e.g. `MA20`.
    pub kind: String,
    /// Resampled, z-normalized window.
    pub vector: Vec<f64>,
    /// Standard deviation of `vector`.
    pub volatility: f64,
}

/// One ranked answer to a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub series_id: String,
    /// Ensemble score in `[0, 1]`.
    pub score: f64,
    /// 1-based position in the result list.
    pub rank: usize,
}
