use serde::Serialize;

use crate::core::config::{DtwConfig, EnsembleWeights};
use crate::core::similarity_metric::{collapse, Measure, SimilarityMetric};
use crate::metrics::cosine::Cosine;
use crate::metrics::dtw::Dtw;
use crate::metrics::pearson::Pearson;

/// Anything that maps a (query, corpus row) pair to a similarity score.
///
/// Rankers are generic over this trait so the per-row loop monomorphizes.
/// Higher is more similar; non-finite scores mark a row as unscoreable.
pub trait Scorer: Send + Sync {
    fn score(&self, query: &[f64], row: &[f64]) -> f64;
}

/// Per-component view of one ensemble score.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ScoreBreakdown {
    /// DTW distance (`0.0` if degenerate).
    pub dtw_distance: f64,
    /// `1 / (1 + dtw_distance / len(query))`, in `(0, 1]`.
    pub dtw_similarity: f64,
    /// Pearson correlation rescaled to `[0, 1]`.
    pub pearson: f64,
    /// Cosine similarity rescaled to `[0, 1]`.
    pub cosine: f64,
    /// Number of components that fell back to the neutral value.
    pub degenerate_components: u8,
    /// Final blended score in `[0, 1]`.
    pub score: f64,
}

/// Weighted blend of DTW shape similarity, Pearson and cosine.
///
/// `score = alpha * dtw_sim + beta * (r + 1) / 2 + gamma * (cos + 1) / 2`,
/// clamped to `[0, 1]`; a non-finite blend becomes `0.0`.
///
/// # Examples
///
/// ```
/// use sketch_rs::{normalize_query, EnsembleScorer, Scorer};
///
/// let up: Vec<f64> = (0..10).map(|i| i as f64).collect();
/// let down: Vec<f64> = up.iter().rev().copied().collect();
/// let q = normalize_query(&up, 128).unwrap();
/// let a = normalize_query(&up, 128).unwrap();
/// let b = normalize_query(&down, 128).unwrap();
///
/// let scorer = EnsembleScorer::default();
/// assert!(scorer.score(&q, &a) >= 0.9);
/// assert!(scorer.score(&q, &b) <= 0.3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EnsembleScorer {
    pub weights: EnsembleWeights,
    dtw: Dtw,
    pearson: Pearson,
    cosine: Cosine,
}

impl EnsembleScorer {
    pub fn new(weights: EnsembleWeights, dtw: DtwConfig) -> Self {
        Self {
            weights,
            dtw: Dtw::new(dtw),
            pearson: Pearson,
            cosine: Cosine,
        }
    }

    /// Score with every component exposed.
    pub fn breakdown(&self, sketch: &[f64], series: &[f64]) -> ScoreBreakdown {
        let measures = self.measures(sketch, series);
        let degenerate_components = measures.iter().filter(|m| m.is_degenerate()).count() as u8;

        let dtw_distance = collapse(Dtw::NAME, measures[0]);
        let d_norm = dtw_distance / sketch.len().max(1) as f64;
        let dtw_similarity = 1.0 / (1.0 + d_norm);
        let pearson = rescale(collapse(Pearson::NAME, measures[1]));
        let cosine = rescale(collapse(Cosine::NAME, measures[2]));

        let w = &self.weights;
        let raw = w.alpha * dtw_similarity + w.beta * pearson + w.gamma * cosine;
        let score = if raw.is_finite() { raw.clamp(0.0, 1.0) } else { 0.0 };

        ScoreBreakdown {
            dtw_distance,
            dtw_similarity,
            pearson,
            cosine,
            degenerate_components,
            score,
        }
    }

    /// Raw component measures without collapsing degeneracy.
    pub fn measures(&self, sketch: &[f64], series: &[f64]) -> [Measure; 3] {
        [
            self.dtw.measure(sketch, series),
            self.pearson.measure(sketch, series),
            self.cosine.measure(sketch, series),
        ]
    }
}

impl Scorer for EnsembleScorer {
    #[inline]
    fn score(&self, query: &[f64], row: &[f64]) -> f64 {
        self.breakdown(query, row).score
    }
}

/// Map `[-1, 1]` onto `[0, 1]`.
#[inline]
fn rescale(x: f64) -> f64 {
    (x + 1.0) / 2.0
}

/// Ensemble score with the default weights and unconstrained DTW.
pub fn ensemble_score(sketch: &[f64], series: &[f64]) -> f64 {
    EnsembleScorer::default().score(sketch, series)
}
