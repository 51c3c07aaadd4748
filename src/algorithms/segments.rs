use chrono::NaiveDate;
use tracing::debug;

use crate::algorithms::normalize::{mean_std, resample, zscore, DEFAULT_EPS};
use crate::core::config::SegmentConfig;
use crate::core::error::{Result, SketchError};
use crate::core::segment::Segment;

/// Slide a fixed-width window over one moving-average series and emit every
/// window that passes the volatility gate.
///
/// For each start `i` in `0..=values.len() - window`:
/// 1. `vec = zscore(resample(values[i..i + window], out_len))`
/// 2. `volatility = std(vec)`
/// 3. emit `Segment { window_start: dates[i], window_end: dates[i + window - 1], .. }`
///    iff `vol_min <= volatility <= vol_max`
///
/// Windows failing the gate are dropped silently; near-flat windows normalize
/// to (near-)zero spread and never pass a positive `vol_min`.
///
/// # Errors
/// `LengthMismatch` if `values` and `dates` differ in length,
/// `InsufficientData` if the series is shorter than one window, and
/// `InvalidParameter` for an invalid config.
pub fn build_segments(
    series_id: &str,
    values: &[f64],
    dates: &[NaiveDate],
    config: &SegmentConfig,
) -> Result<Vec<Segment>> {
    config.validate()?;
    if values.len() != dates.len() {
        return Err(SketchError::LengthMismatch {
            context: "series values vs dates",
            expected: dates.len(),
            got: values.len(),
        });
    }
    let w = config.window;
    if values.len() < w {
        return Err(SketchError::insufficient("segment window", w, values.len()));
    }

    let n_windows = values.len() - w + 1;
    let mut segments = Vec::new();

    for i in 0..n_windows {
        let vector = zscore(&resample(&values[i..i + w], config.out_len)?, DEFAULT_EPS);
        let (_, volatility) = mean_std(&vector);
        if !config.admits(volatility) {
            continue;
        }
        segments.push(Segment {
            series_id: series_id.to_string(),
            window_start: dates[i],
            window_end: dates[i + w - 1],
            kind: config.kind.clone(),
            vector,
            volatility,
        });
    }

    debug!(
        series_id,
        kind = %config.kind,
        windows = n_windows,
        emitted = segments.len(),
        gated = n_windows - segments.len(),
        "built segments"
    );
    Ok(segments)
}
