use crate::core::config::DtwConfig;
use crate::core::similarity_metric::{Degeneracy, Measure, SimilarityMetric};

/// Dynamic time warping distance with absolute-difference local cost.
///
/// `D(i, j) = |a_i - b_j| + min(D(i-1, j-1), D(i-1, j), D(i, j-1))`, with the
/// path anchored at both corners. Only two rows of the cumulative table are
/// kept, so memory is O(m) while time is O(n*m), or O(n*r) under a band.
///
/// Edge cases:
/// - Empty input or any NaN/infinite sample → `Degenerate`
/// - A band narrower than `|n - m|` is widened to `|n - m|` so the end corner
///   stays reachable
#[derive(Debug, Clone, Copy, Default)]
pub struct Dtw {
    pub config: DtwConfig,
}

impl Dtw {
    pub fn new(config: DtwConfig) -> Self {
        Self { config }
    }

    /// Unconstrained DTW (full cost table).
    pub fn unconstrained() -> Self {
        Self::new(DtwConfig::unconstrained())
    }

    /// DTW restricted to a Sakoe-Chiba band of the given radius.
    pub fn banded(radius: usize) -> Self {
        Self::new(DtwConfig::with_band(radius))
    }

    fn cumulative_cost(&self, a: &[f64], b: &[f64]) -> f64 {
        let n = a.len();
        let m = b.len();
        let radius = self.config.band.map(|r| r.max(n.abs_diff(m)));

        let mut prev = vec![f64::INFINITY; m + 1];
        let mut curr = vec![f64::INFINITY; m + 1];
        prev[0] = 0.0;

        for i in 1..=n {
            curr.fill(f64::INFINITY);
            let (lo, hi) = match radius {
                Some(r) => (i.saturating_sub(r).max(1), (i + r).min(m)),
                None => (1, m),
            };
            let ai = a[i - 1];
            for j in lo..=hi {
                let best = prev[j - 1].min(prev[j]).min(curr[j - 1]);
                curr[j] = (ai - b[j - 1]).abs() + best;
            }
            std::mem::swap(&mut prev, &mut curr);
        }

        prev[m]
    }
}

impl SimilarityMetric for Dtw {
    const NAME: &'static str = "dtw";

    fn measure(&self, a: &[f64], b: &[f64]) -> Measure {
        if a.is_empty() || b.is_empty() {
            return Measure::Degenerate(Degeneracy::Shape);
        }
        if a.iter().chain(b).any(|x| !x.is_finite()) {
            return Measure::Degenerate(Degeneracy::NonFinite);
        }
        let d = self.cumulative_cost(a, b);
        if d.is_finite() {
            Measure::Value(d.max(0.0))
        } else {
            Measure::Degenerate(Degeneracy::NonFinite)
        }
    }
}

/// Unconstrained DTW distance; degenerate input yields `0.0`.
pub fn dtw_distance(a: &[f64], b: &[f64]) -> f64 {
    Dtw::unconstrained().evaluate(a, b)
}
