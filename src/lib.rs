pub mod algorithms;
pub mod core;
pub mod metrics;
pub mod validation;

pub use crate::algorithms::ensemble::{ensemble_score, EnsembleScorer, ScoreBreakdown, Scorer};
pub use crate::algorithms::moving_average::{moving_average, AveragedSeries};
pub use crate::algorithms::normalize::{normalize_query, resample, zscore};
pub use crate::algorithms::segments::build_segments;
pub use crate::algorithms::topk::{rank_top_k, score_all};
pub use crate::core::config::{
    DtwConfig, EngineConfig, EnsembleWeights, MovingAverageConfig, QueryConfig, SegmentConfig,
};
pub use crate::core::corpus::{Corpus, RowWindow, SegmentSelection};
pub use crate::core::error::{Result, SketchError};
pub use crate::core::response::{SearchResponse, SimilarItem};
pub use crate::core::segment::{ScoreResult, Segment};
pub use crate::core::similarity_metric::{Degeneracy, Measure, SimilarityMetric};
pub use crate::core::store::CorpusStore;
pub use crate::metrics::cosine::Cosine;
pub use crate::metrics::dtw::Dtw;
pub use crate::metrics::pearson::Pearson;
pub use crate::validation::patterns::Pattern;

use chrono::NaiveDate;

use crate::algorithms::topk::top_k_rows;

/// High-level facade for sketch search, generic over the row scorer.
///
/// Holds one validated [`EngineConfig`] and applies it to every stage: the
/// moving average, the segment builder, query normalization and ranking.
///
/// # Examples
///
/// ```
/// use sketch_rs::{Corpus, EngineConfig, EnsembleEngine};
///
/// let up: Vec<f64> = (0..10).map(|i| i as f64).collect();
/// let down: Vec<f64> = up.iter().rev().copied().collect();
///
/// let engine = EnsembleEngine::new(EngineConfig::default()).unwrap();
/// let corpus = Corpus::from_series("MA20", [("UP", &up), ("DOWN", &down)], 128, 2).unwrap();
///
/// let response = engine.search(&up, &corpus, 5).unwrap();
/// assert_eq!(response.series_ids(), vec!["UP", "DOWN"]);
/// assert!(response.items[0].score >= 0.9);
/// assert!(response.items[1].score <= 0.3);
/// ```
#[derive(Debug, Clone)]
pub struct SearchEngine<S: Scorer = EnsembleScorer> {
    config: EngineConfig,
    scorer: S,
}

impl SearchEngine<EnsembleScorer> {
    /// Create an engine scoring with the configured ensemble weights and DTW band.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let scorer = EnsembleScorer::new(config.weights, config.dtw);
        Self::with_scorer(config, scorer)
    }
}

impl Default for SearchEngine<EnsembleScorer> {
    fn default() -> Self {
        let config = EngineConfig::default();
        Self {
            scorer: EnsembleScorer::new(config.weights, config.dtw),
            config,
        }
    }
}

impl<S: Scorer> SearchEngine<S> {
    /// Create an engine with a custom scorer.
    pub fn with_scorer(config: EngineConfig, scorer: S) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, scorer })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn scorer(&self) -> &S {
        &self.scorer
    }

    /// Moving average of raw closes with the configured window.
    pub fn average_closes(
        &self,
        series_id: impl Into<String>,
        dates: &[NaiveDate],
        closes: &[f64],
    ) -> Result<AveragedSeries> {
        AveragedSeries::from_closes(series_id, dates, closes, &self.config.moving_average)
    }

    /// Slide the configured segment window over one series.
    pub fn build_segments(
        &self,
        series_id: &str,
        values: &[f64],
        dates: &[NaiveDate],
    ) -> Result<Vec<Segment>> {
        build_segments(series_id, values, dates, &self.config.segment)
    }

    /// Normalize a sketch to the configured segment length.
    pub fn normalize_query(&self, raw_points: &[f64]) -> Result<Vec<f64>> {
        normalize_query(raw_points, self.config.segment.out_len)
    }

    /// Rank an already normalized query.
    pub fn rank_top_k(&self, query: &[f64], corpus: &Corpus, k: usize) -> Vec<ScoreResult> {
        rank_top_k(query, corpus, k, &self.scorer)
    }

    /// Search with the configured default `k`.
    pub fn search_default(&self, raw_points: &[f64], corpus: &Corpus) -> Result<SearchResponse> {
        self.search(raw_points, corpus, self.config.query.k)
    }

    /// Normalize a raw sketch to the corpus width and return the `k` best rows.
    ///
    /// # Errors
    /// `InsufficientData` if the sketch has fewer than `query.min_points` points.
    pub fn search(&self, raw_points: &[f64], corpus: &Corpus, k: usize) -> Result<SearchResponse> {
        let min_points = self.config.query.min_points;
        if raw_points.len() < min_points {
            return Err(SketchError::insufficient("query sketch", min_points, raw_points.len()));
        }
        if corpus.is_empty() {
            tracing::warn!(kind = corpus.kind(), "search against an empty corpus");
            return Ok(SearchResponse::default());
        }

        let sketch_norm = normalize_query(raw_points, corpus.width())?;
        let items = top_k_rows(&sketch_norm, corpus, k, &self.scorer)
            .into_iter()
            .enumerate()
            .map(|(pos, (row, score))| SimilarItem {
                series_id: corpus.ids()[row].clone(),
                score,
                rank: pos + 1,
                window: corpus.window(row),
                series_norm: corpus.row(row).to_vec(),
                sketch_norm: sketch_norm.clone(),
            })
            .collect();
        Ok(SearchResponse { items })
    }
}

/// Convenience type alias for the default ensemble scorer.
pub type EnsembleEngine = SearchEngine<EnsembleScorer>;

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64).collect()
    }

    #[test]
    fn test_search_rejects_short_sketch() {
        let engine = EnsembleEngine::default();
        let corpus = Corpus::from_series("MA20", [("A", ramp(40))], 128, 2).unwrap();
        let err = engine.search(&ramp(9), &corpus, 5).unwrap_err();
        assert!(matches!(
            err,
            SketchError::InsufficientData { need: 10, got: 9, .. }
        ));
    }

    #[test]
    fn test_search_empty_corpus_is_empty_response() {
        let engine = EnsembleEngine::default();
        let response = engine.search(&ramp(10), &Corpus::empty("MA20"), 5).unwrap();
        assert!(response.is_empty());
    }

    #[test]
    fn test_search_normalizes_to_corpus_width() {
        let engine = EnsembleEngine::default();
        let corpus = Corpus::from_series("MA20", [("A", ramp(40))], 64, 2).unwrap();
        let response = engine.search(&ramp(10), &corpus, 5).unwrap();
        assert_eq!(response.len(), 1);
        let item = &response.items[0];
        assert_eq!(item.sketch_norm.len(), 64);
        assert_eq!(item.series_norm, corpus.row(0));
        assert_eq!(item.rank, 1);
        assert!(item.window.is_none());
        assert!(item.score > 0.99, "score {}", item.score);
    }

    #[test]
    fn test_search_with_huge_k_returns_whole_corpus() {
        let engine = EnsembleEngine::default();
        let down: Vec<f64> = ramp(40).into_iter().rev().collect();
        let corpus = Corpus::from_series("MA20", [("UP", ramp(40)), ("DOWN", down)], 64, 2).unwrap();
        for k in [usize::MAX, usize::MAX / 16] {
            let response = engine.search(&ramp(10), &corpus, k).unwrap();
            assert_eq!(response.series_ids(), vec!["UP", "DOWN"]);
        }
    }

    #[test]
    fn test_search_reports_matched_segment_window() {
        let engine = EnsembleEngine::default();
        let day = |d| NaiveDate::from_ymd_opt(2024, 5, d).unwrap();
        let up = normalize_query(&ramp(10), 32).unwrap();
        let down: Vec<f64> = up.iter().rev().copied().collect();
        let segments = vec![
            Segment {
                series_id: "AAPL".into(),
                window_start: day(1),
                window_end: day(10),
                kind: "MA20".into(),
                vector: down,
                volatility: 1.0,
            },
            Segment {
                series_id: "AAPL".into(),
                window_start: day(2),
                window_end: day(11),
                kind: "MA20".into(),
                vector: up,
                volatility: 1.0,
            },
        ];
        let corpus = Corpus::from_segments("MA20", segments, SegmentSelection::All).unwrap();
        let response = engine.search(&ramp(12), &corpus, 1).unwrap();
        assert_eq!(response.len(), 1);
        assert_eq!(response.items[0].window.unwrap().start, day(2));
    }

    #[test]
    fn test_new_rejects_bad_weights() {
        let mut config = EngineConfig::default();
        config.weights = EnsembleWeights::new(0.5, 0.5, 0.5);
        assert!(matches!(
            EnsembleEngine::new(config).unwrap_err(),
            SketchError::InvalidConfig(_)
        ));
    }

    #[test]
    fn test_search_default_uses_configured_k() {
        let mut config = EngineConfig::default();
        config.query.k = 2;
        let engine = EnsembleEngine::new(config).unwrap();
        let series: Vec<(String, Vec<f64>)> = (0..5)
            .map(|i| (format!("S{i}"), ramp(20 + i)))
            .collect();
        let corpus = Corpus::from_series("MA20", series, 32, 10).unwrap();
        let response = engine.search_default(&ramp(15), &corpus).unwrap();
        assert_eq!(response.len(), 2);
        assert!(response.to_json().unwrap().contains("\"sketch_norm\""));
    }
}
