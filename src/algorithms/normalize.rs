use tracing::debug;

use crate::core::error::{Result, SketchError};

/// Default variance floor for [`zscore`].
pub const DEFAULT_EPS: f64 = 1e-8;

/// Resample `y` to `out_len` points by piecewise-linear interpolation.
///
/// Both the source and the target grid span `[0, 1]`, so every target point
/// falls inside the source range. Target points that land exactly on a source
/// node reproduce the source value, so `resample(y, y.len())` returns `y`.
///
/// # Errors
/// `InsufficientData` if `y` has fewer than 2 points, `InvalidParameter` if
/// `out_len < 2`.
pub fn resample(y: &[f64], out_len: usize) -> Result<Vec<f64>> {
    let n = y.len();
    if n < 2 {
        return Err(SketchError::insufficient("resample", 2, n));
    }
    if out_len < 2 {
        return Err(SketchError::invalid("out_len", "must be >= 2"));
    }

    let src_span = n - 1;
    let dst_span = (out_len - 1) as f64;

    let out = (0..out_len)
        .map(|j| {
            // Position on the source index axis; the integer numerator keeps
            // node hits exact.
            let t = (j * src_span) as f64 / dst_span;
            let i0 = t.floor() as usize;
            if i0 >= src_span {
                return y[src_span];
            }
            let frac = t - i0 as f64;
            if frac == 0.0 {
                y[i0]
            } else {
                y[i0] + frac * (y[i0 + 1] - y[i0])
            }
        })
        .collect();

    Ok(out)
}

/// Population mean and standard deviation.
///
/// Returns `(NaN, NaN)` for an empty slice.
pub fn mean_std(y: &[f64]) -> (f64, f64) {
    let n = y.len() as f64;
    let mu = y.iter().sum::<f64>() / n;
    let var = y.iter().map(|v| (v - mu) * (v - mu)).sum::<f64>() / n;
    (mu, var.max(0.0).sqrt())
}

/// Z-score normalize `y` (zero mean, unit population variance).
///
/// Never fails and always returns a finite sequence of the input's length:
/// - all-NaN input yields all zeros;
/// - remaining NaNs are replaced by the mean of the non-NaN samples;
/// - a standard deviation below `eps` yields the centered, unscaled sequence;
/// - any residual non-finite output is replaced by `0.0`.
pub fn zscore(y: &[f64], eps: f64) -> Vec<f64> {
    if y.is_empty() {
        return Vec::new();
    }

    let nan_count = y.iter().filter(|v| v.is_nan()).count();
    if nan_count == y.len() {
        debug!(len = y.len(), "zscore input is entirely NaN, returning zeros");
        return vec![0.0; y.len()];
    }

    let cleaned: Vec<f64> = if nan_count > 0 {
        let (sum, count) = y
            .iter()
            .filter(|v| !v.is_nan())
            .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
        let fill = sum / count as f64;
        debug!(nan_count, fill, "replacing NaN samples with the non-NaN mean");
        y.iter().map(|&v| if v.is_nan() { fill } else { v }).collect()
    } else {
        y.to_vec()
    };

    let (mu, std) = mean_std(&cleaned);
    let mut out: Vec<f64> = if std < eps {
        debug!(std, eps, "near-constant input, centering without scaling");
        cleaned.iter().map(|v| v - mu).collect()
    } else {
        cleaned.iter().map(|v| (v - mu) / std).collect()
    };

    let mut residual = 0usize;
    for v in out.iter_mut() {
        if !v.is_finite() {
            *v = 0.0;
            residual += 1;
        }
    }
    if residual > 0 {
        debug!(residual, "zeroed non-finite values after normalization");
    }

    out
}

/// Turn raw sketch points into a query vector: resample to `out_len`, then z-score.
///
/// ```
/// use sketch_rs::normalize_query;
///
/// let sketch: Vec<f64> = (0..10).map(|i| i as f64).collect();
/// let q = normalize_query(&sketch, 128).unwrap();
/// assert_eq!(q.len(), 128);
/// assert!(q[0] < 0.0 && q[127] > 0.0);
/// ```
pub fn normalize_query(raw_points: &[f64], out_len: usize) -> Result<Vec<f64>> {
    let resampled = resample(raw_points, out_len)?;
    Ok(zscore(&resampled, DEFAULT_EPS))
}
