use chrono::NaiveDate;
use tracing::debug;

use crate::algorithms::segments::build_segments;
use crate::core::config::{MovingAverageConfig, SegmentConfig};
use crate::core::error::{Result, SketchError};
use crate::core::segment::Segment;

/// Trailing simple moving average.
///
/// Output element `i` is the mean of `values[i..i + window]`, so the result has
/// `values.len() - window + 1` elements and the leading incomplete windows are
/// dropped. Computed from cumulative sums in a single pass.
pub fn moving_average(values: &[f64], window: usize) -> Result<Vec<f64>> {
    if window == 0 {
        return Err(SketchError::invalid("window", "must be > 0"));
    }
    if values.len() < window {
        return Err(SketchError::insufficient("moving average", window, values.len()));
    }

    let mut cumsum = vec![0.0; values.len() + 1];
    for (i, v) in values.iter().enumerate() {
        cumsum[i + 1] = cumsum[i] + v;
    }

    let w = window as f64;
    Ok((0..=values.len() - window)
        .map(|i| (cumsum[i + window] - cumsum[i]) / w)
        .collect())
}

/// A gap-free moving-average series with aligned dates.
#[derive(Debug, Clone, PartialEq)]
pub struct AveragedSeries {
    pub series_id: String,
    /// Kind label, e.g. `MA20`.
    pub kind: String,
    /// `dates[i]` is the last trading day covered by `values[i]`.
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

impl AveragedSeries {
    /// Average raw closes.
    ///
    /// Non-finite closes are treated as gaps and dropped together with their
    /// dates before averaging.
    ///
    /// # Errors
    /// `LengthMismatch` if `dates` and `closes` differ in length,
    /// `InsufficientData` if fewer than `config.min_points` finite closes remain.
    pub fn from_closes(
        series_id: impl Into<String>,
        dates: &[NaiveDate],
        closes: &[f64],
        config: &MovingAverageConfig,
    ) -> Result<Self> {
        config.validate()?;
        if dates.len() != closes.len() {
            return Err(SketchError::LengthMismatch {
                context: "closes vs dates",
                expected: dates.len(),
                got: closes.len(),
            });
        }

        let (kept_dates, kept_closes): (Vec<NaiveDate>, Vec<f64>) = dates
            .iter()
            .zip(closes)
            .filter(|(_, c)| c.is_finite())
            .map(|(d, c)| (*d, *c))
            .unzip();

        let series_id = series_id.into();
        let gaps = closes.len() - kept_closes.len();
        if gaps > 0 {
            debug!(series_id = %series_id, gaps, "dropped non-finite closes");
        }
        if kept_closes.len() < config.min_points {
            return Err(SketchError::insufficient(
                "moving average input",
                config.min_points,
                kept_closes.len(),
            ));
        }

        let values = moving_average(&kept_closes, config.window)?;
        let dates = kept_dates[config.window - 1..].to_vec();
        debug_assert_eq!(dates.len(), values.len());

        Ok(Self {
            series_id,
            kind: config.kind(),
            dates,
            values,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Slide the segment window over this series; segments carry this series' kind.
    pub fn build_segments(&self, config: &SegmentConfig) -> Result<Vec<Segment>> {
        let config = config.clone().with_kind(self.kind.clone());
        build_segments(&self.series_id, &self.values, &self.dates, &config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn days(n: usize) -> Vec<NaiveDate> {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        (0..n)
            .map(|i| start + chrono::Duration::days(i as i64))
            .collect()
    }

    #[test]
    fn test_moving_average_hand_computed() {
        let ma = moving_average(&[1.0, 2.0, 3.0, 4.0, 5.0], 3).unwrap();
        assert_eq!(ma, vec![2.0, 3.0, 4.0]);
        assert_eq!(moving_average(&[4.0, 6.0], 1).unwrap(), vec![4.0, 6.0]);
    }

    #[test]
    fn test_moving_average_errors() {
        assert!(matches!(
            moving_average(&[1.0, 2.0], 3).unwrap_err(),
            SketchError::InsufficientData { need: 3, got: 2, .. }
        ));
        assert!(moving_average(&[1.0], 0).is_err());
    }

    #[test]
    fn test_from_closes_aligns_dates_and_drops_gaps() {
        let dates = days(30);
        let mut closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        closes[3] = f64::NAN;

        let config = MovingAverageConfig::new(5);
        let series = AveragedSeries::from_closes("AAPL", &dates, &closes, &config).unwrap();
        assert_eq!(series.kind, "MA5");
        // 29 finite closes → 25 averages
        assert_eq!(series.len(), 25);
        assert_eq!(series.dates.len(), series.len());
        // First window: closes 0,1,2,4,5 (index 3 dropped)
        assert_eq!(series.dates[0], dates[5]);
        assert!((series.values[0] - (100.0 + 101.0 + 102.0 + 104.0 + 105.0) / 5.0).abs() < 1e-9);
        assert_eq!(*series.dates.last().unwrap(), dates[29]);
    }

    #[test]
    fn test_from_closes_requires_min_points() {
        let dates = days(24);
        let closes = vec![10.0; 24];
        let err = AveragedSeries::from_closes("X", &dates, &closes, &MovingAverageConfig::default())
            .unwrap_err();
        assert!(matches!(err, SketchError::InsufficientData { need: 25, got: 24, .. }));

        let err = AveragedSeries::from_closes("X", &dates[..3], &closes, &MovingAverageConfig::default())
            .unwrap_err();
        assert!(matches!(err, SketchError::LengthMismatch { .. }));
    }

    #[test]
    fn test_build_segments_uses_series_kind() {
        let n = 140;
        let dates = days(n);
        let closes: Vec<f64> = (0..n).map(|i| 50.0 + (i as f64 * 0.1).sin() * 5.0).collect();
        let series =
            AveragedSeries::from_closes("MSFT", &dates, &closes, &MovingAverageConfig::default()).unwrap();
        let segs = series.build_segments(&SegmentConfig::new(60, 64)).unwrap();
        assert!(!segs.is_empty());
        assert!(segs.iter().all(|s| s.kind == "MA20" && s.series_id == "MSFT"));
    }
}
