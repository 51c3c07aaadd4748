use crate::core::similarity_metric::{check_inputs, Degeneracy, Measure, SimilarityMetric};

/// Standard deviation below which a sequence is treated as constant.
pub const MIN_STD: f64 = 1e-10;

/// Pearson correlation coefficient in `[-1, 1]`.
///
/// Edge cases:
/// - Either side with population std below [`MIN_STD`] → `Degenerate(LowVariance)`
/// - NaN/infinite samples or unequal lengths → `Degenerate`
/// - `r` is clamped to `[-1, 1]` for numerical stability
#[derive(Debug, Clone, Copy, Default)]
pub struct Pearson;

impl SimilarityMetric for Pearson {
    const NAME: &'static str = "pearson";

    fn measure(&self, a: &[f64], b: &[f64]) -> Measure {
        if let Some(reason) = check_inputs(a, b) {
            return Measure::Degenerate(reason);
        }

        let n = a.len() as f64;
        let mu_a = a.iter().sum::<f64>() / n;
        let mu_b = b.iter().sum::<f64>() / n;

        let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
        for (x, y) in a.iter().zip(b) {
            let dx = x - mu_a;
            let dy = y - mu_b;
            cov += dx * dy;
            var_a += dx * dx;
            var_b += dy * dy;
        }

        let std_a = (var_a / n).sqrt();
        let std_b = (var_b / n).sqrt();
        if std_a < MIN_STD || std_b < MIN_STD {
            return Measure::Degenerate(Degeneracy::LowVariance);
        }

        let r = cov / (var_a.sqrt() * var_b.sqrt());
        if r.is_finite() {
            Measure::Value(r.clamp(-1.0, 1.0))
        } else {
            Measure::Degenerate(Degeneracy::NonFinite)
        }
    }
}

/// Pearson correlation; degenerate input yields `0.0`.
pub fn pearson(a: &[f64], b: &[f64]) -> f64 {
    Pearson.evaluate(a, b)
}
