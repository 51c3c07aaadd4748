use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SketchError};

/// Configuration for sliding-window segment construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    /// Window width in samples (business days).
    pub window: usize,
    /// Length every window is resampled to.
    pub out_len: usize,
    /// Lower bound of the admissible post-normalization standard deviation.
    pub vol_min: f64,
    /// Upper bound of the admissible post-normalization standard deviation.
    pub vol_max: f64,
    /// Label stored on every emitted segment, e.g. `MA20`.
    pub kind: String,
}

impl SegmentConfig {
    pub fn new(window: usize, out_len: usize) -> Self {
        Self {
            window,
            out_len,
            ..Self::default()
        }
    }

    /// Replace the volatility gate.
    pub fn with_volatility_range(mut self, vol_min: f64, vol_max: f64) -> Self {
        self.vol_min = vol_min;
        self.vol_max = vol_max;
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    /// Whether a segment volatility passes the gate (inclusive on both ends).
    #[inline]
    pub fn admits(&self, volatility: f64) -> bool {
        self.vol_min <= volatility && volatility <= self.vol_max
    }

    pub fn validate(&self) -> Result<()> {
        if self.window < 2 {
            return Err(SketchError::invalid("window", "must be >= 2"));
        }
        if self.out_len < 2 {
            return Err(SketchError::invalid("out_len", "must be >= 2"));
        }
        if !self.vol_min.is_finite() || !self.vol_max.is_finite() || self.vol_min > self.vol_max {
            return Err(SketchError::invalid(
                "vol_range",
                format!("expected finite vol_min <= vol_max, got [{}, {}]", self.vol_min, self.vol_max),
            ));
        }
        if self.kind.is_empty() {
            return Err(SketchError::invalid("kind", "must not be empty"));
        }
        Ok(())
    }
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            window: 90,
            out_len: 128,
            vol_min: 0.2,
            vol_max: 2.0,
            kind: "MA20".to_string(),
        }
    }
}

/// Blend weights of the ensemble score.
///
/// `alpha` weighs DTW shape alignment, `beta` Pearson co-movement and
/// `gamma` cosine angle. They must sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleWeights {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl EnsembleWeights {
    pub fn new(alpha: f64, beta: f64, gamma: f64) -> Self {
        Self { alpha, beta, gamma }
    }

    pub fn validate(&self) -> Result<()> {
        let all = [self.alpha, self.beta, self.gamma];
        if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(SketchError::InvalidConfig(format!(
                "ensemble weights must be finite and non-negative, got {all:?}"
            )));
        }
        let sum: f64 = all.iter().sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(SketchError::InvalidConfig(format!(
                "ensemble weights must sum to 1, got {sum}"
            )));
        }
        Ok(())
    }
}

impl Default for EnsembleWeights {
    fn default() -> Self {
        Self::new(0.7, 0.2, 0.1)
    }
}

/// Dynamic time warping options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DtwConfig {
    /// Sakoe-Chiba band radius. `None` fills the full cost table.
    pub band: Option<usize>,
}

impl DtwConfig {
    pub fn unconstrained() -> Self {
        Self { band: None }
    }

    pub fn with_band(radius: usize) -> Self {
        Self { band: Some(radius) }
    }
}

/// Query-time options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Minimum number of sketch points accepted by a search.
    pub min_points: usize,
    /// Default number of results.
    pub k: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            min_points: 10,
            k: 5,
        }
    }
}

/// Moving-average preparation of raw closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovingAverageConfig {
    /// Trailing window length.
    pub window: usize,
    /// Minimum number of finite closes required before averaging.
    pub min_points: usize,
}

impl MovingAverageConfig {
    /// Require a few closes beyond the first full window.
    pub fn new(window: usize) -> Self {
        Self {
            window,
            min_points: window + 5,
        }
    }

    /// Series kind label, e.g. `MA20`.
    pub fn kind(&self) -> String {
        format!("MA{}", self.window)
    }

    pub fn validate(&self) -> Result<()> {
        if self.window == 0 {
            return Err(SketchError::invalid("ma_window", "must be > 0"));
        }
        if self.min_points < self.window {
            return Err(SketchError::invalid(
                "ma_min_points",
                format!("must be >= window ({}), got {}", self.window, self.min_points),
            ));
        }
        Ok(())
    }
}

impl Default for MovingAverageConfig {
    fn default() -> Self {
        Self {
            window: 20,
            min_points: 25,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub segment: SegmentConfig,
    pub weights: EnsembleWeights,
    pub dtw: DtwConfig,
    pub query: QueryConfig,
    pub moving_average: MovingAverageConfig,
}

impl EngineConfig {
    /// Parse a JSON document; missing fields take their defaults.
    ///
    /// ```
    /// use sketch_rs::EngineConfig;
    ///
    /// let config = EngineConfig::from_json_str(r#"{"segment": {"window": 60}}"#).unwrap();
    /// assert_eq!(config.segment.window, 60);
    /// assert_eq!(config.segment.out_len, 128);
    /// ```
    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.segment.validate()?;
        self.weights.validate()?;
        self.moving_average.validate()?;
        if self.query.min_points < 2 {
            return Err(SketchError::invalid("query.min_points", "must be >= 2"));
        }
        if self.query.k == 0 {
            return Err(SketchError::invalid("query.k", "must be >= 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_design_constants() {
        let config = EngineConfig::default();
        assert_eq!(config.segment.window, 90);
        assert_eq!(config.segment.out_len, 128);
        assert_eq!(config.segment.kind, "MA20");
        assert_eq!(config.query.k, 5);
        assert_eq!(config.query.min_points, 10);
        assert_eq!(config.dtw.band, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_volatility_gate_inclusive() {
        let seg = SegmentConfig::default();
        assert!(seg.admits(0.2));
        assert!(seg.admits(2.0));
        assert!(!seg.admits(0.19));
        assert!(!seg.admits(2.01));
        assert!(!seg.admits(f64::NAN));
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        assert!(EnsembleWeights::new(0.5, 0.2, 0.1).validate().is_err());
        assert!(EnsembleWeights::new(1.2, -0.1, -0.1).validate().is_err());
        assert!(EnsembleWeights::new(0.5, 0.25, 0.25).validate().is_ok());
    }

    #[test]
    fn test_from_json_partial_document() {
        let config = EngineConfig::from_json_str(
            r#"{"weights": {"alpha": 0.6, "beta": 0.3, "gamma": 0.1}, "dtw": {"band": 8}}"#,
        )
        .unwrap();
        assert_eq!(config.weights.alpha, 0.6);
        assert_eq!(config.dtw.band, Some(8));
        assert_eq!(config.segment, SegmentConfig::default());
    }

    #[test]
    fn test_from_json_rejects_invalid_values() {
        let err = EngineConfig::from_json_str(r#"{"segment": {"vol_min": 3.0, "vol_max": 1.0}}"#)
            .unwrap_err();
        assert!(matches!(err, SketchError::InvalidParameter { name: "vol_range", .. }));

        let err = EngineConfig::from_json_str("[1, 2").unwrap_err();
        assert!(matches!(err, SketchError::Config(_)));
    }

    #[test]
    fn test_moving_average_kind_label() {
        assert_eq!(MovingAverageConfig::new(30).kind(), "MA30");
        assert!(MovingAverageConfig::new(30).validate().is_ok());
        assert!(MovingAverageConfig { window: 30, min_points: 10 }.validate().is_err());
    }
}
