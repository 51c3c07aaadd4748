use crate::core::similarity_metric::{check_inputs, Degeneracy, Measure, SimilarityMetric};

/// Norm below which a vector has no direction.
pub const MIN_NORM: f64 = 1e-10;

/// Stabilizer added to the norm product in the denominator.
pub const COSINE_EPS: f64 = 1e-9;

/// Cosine similarity `dot(a, b) / (|a| * |b| + eps)`, clamped to `[-1, 1]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cosine;

impl SimilarityMetric for Cosine {
    const NAME: &'static str = "cosine";

    fn measure(&self, a: &[f64], b: &[f64]) -> Measure {
        if let Some(reason) = check_inputs(a, b) {
            return Measure::Degenerate(reason);
        }

        let (mut dot, mut sq_a, mut sq_b) = (0.0, 0.0, 0.0);
        for (x, y) in a.iter().zip(b) {
            dot += x * y;
            sq_a += x * x;
            sq_b += y * y;
        }
        let norm_a = sq_a.sqrt();
        let norm_b = sq_b.sqrt();
        if norm_a < MIN_NORM || norm_b < MIN_NORM {
            return Measure::Degenerate(Degeneracy::ZeroNorm);
        }

        let s = dot / (norm_a * norm_b + COSINE_EPS);
        if s.is_finite() {
            Measure::Value(s.clamp(-1.0, 1.0))
        } else {
            Measure::Degenerate(Degeneracy::NonFinite)
        }
    }
}

/// Cosine similarity; degenerate input yields `0.0`.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    Cosine.evaluate(a, b)
}
