use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::algorithms::ensemble::Scorer;
use crate::core::corpus::Corpus;
use crate::core::error::Result;
use crate::core::segment::ScoreResult;
use crate::validation::patterns::{add_noise, Pattern};
use crate::validation::retrieval::{ndcg_at_k, precision_at_k, recall_at_k};
use crate::SearchEngine;

/// Noise level of the "close match" query variant.
pub const LOW_NOISE: f64 = 0.1;
/// Noise level of the "loose match" query variant.
pub const HIGH_NOISE: f64 = 0.3;

/// One labelled query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationCase {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Raw sketch points.
    pub query: Vec<f64>,
    /// Ids that should appear near the top.
    #[serde(default)]
    pub expected_similar: Vec<String>,
    /// Ids that should not appear at all.
    #[serde(default)]
    pub expected_dissimilar: Vec<String>,
    /// Inclusive range the best score is expected to fall in.
    pub expected_score_range: (f64, f64),
}

#[derive(Debug, Clone, Serialize)]
pub struct CaseResult {
    pub name: String,
    pub description: String,
    pub top: Vec<ScoreResult>,
    pub max_score: f64,
    pub avg_score: f64,
    pub min_score: f64,
    pub expected_range: (f64, f64),
    /// Best score lies inside `expected_range`.
    pub in_range: bool,
    pub precision: f64,
    pub recall: f64,
    pub ndcg: f64,
    /// Expected-dissimilar ids that were retrieved anyway.
    pub dissimilar_hits: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationSummary {
    pub total: usize,
    pub passed: usize,
    pub avg_max_score: f64,
    pub avg_avg_score: f64,
    pub mean_precision: f64,
    pub mean_ndcg: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub summary: ValidationSummary,
    pub details: Vec<CaseResult>,
    pub generated_at: DateTime<Utc>,
}

impl ValidationReport {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Id under which the clean form of `pattern` is stored in [`pattern_corpus`].
pub fn original_id(pattern: Pattern) -> String {
    format!("{}_original", pattern.name())
}

/// A corpus holding one clean, normalized row per shaped pattern.
pub fn pattern_corpus(kind: &str, length: usize) -> Result<Corpus> {
    let mut ids = Vec::with_capacity(Pattern::SHAPED.len());
    let mut rows = Vec::with_capacity(Pattern::SHAPED.len());
    for p in Pattern::SHAPED {
        ids.push(original_id(p));
        rows.push(p.sketch(length)?);
    }
    Corpus::from_rows(kind, ids, rows)
}

/// The standard labelled query set.
///
/// Per shaped pattern: the clean sketch, a low-noise and a high-noise copy.
/// One extra case queries the uptrend and expects the downtrend to stay out
/// of the results. Noise is drawn from `seed`.
pub fn standard_cases(length: usize, seed: u64) -> Result<Vec<ValidationCase>> {
    let mut cases = Vec::new();
    for (i, p) in Pattern::SHAPED.into_iter().enumerate() {
        let clean = p.sketch(length)?;
        let target = vec![original_id(p)];
        let base_seed = seed.wrapping_add(2 * i as u64);

        cases.push(ValidationCase {
            name: format!("{p}_original"),
            description: "identical pattern".into(),
            query: clean.clone(),
            expected_similar: target.clone(),
            expected_dissimilar: Vec::new(),
            expected_score_range: (0.9, 1.0),
        });
        cases.push(ValidationCase {
            name: format!("{p}_noisy_low"),
            description: "pattern with low noise".into(),
            query: add_noise(&clean, LOW_NOISE, base_seed),
            expected_similar: target.clone(),
            expected_dissimilar: Vec::new(),
            expected_score_range: (0.7, 0.9),
        });
        cases.push(ValidationCase {
            name: format!("{p}_noisy_high"),
            description: "pattern with high noise".into(),
            query: add_noise(&clean, HIGH_NOISE, base_seed.wrapping_add(1)),
            expected_similar: target,
            expected_dissimilar: Vec::new(),
            expected_score_range: (0.4, 0.7),
        });
    }

    cases.push(ValidationCase {
        name: "uptrend_vs_downtrend".into(),
        description: "opposite pattern".into(),
        query: Pattern::Uptrend.sketch(length)?,
        expected_similar: Vec::new(),
        expected_dissimilar: vec![original_id(Pattern::Downtrend)],
        expected_score_range: (0.0, 0.4),
    });
    Ok(cases)
}

/// Run every case through `engine.search` and grade the results.
///
/// A case with no results scores `0.0` everywhere and is never in range.
///
/// # Errors
/// Propagates search errors (e.g. a query shorter than the configured minimum).
pub fn run_validation<S: Scorer>(
    engine: &SearchEngine<S>,
    corpus: &Corpus,
    cases: &[ValidationCase],
    k: usize,
) -> Result<ValidationReport> {
    let mut details = Vec::with_capacity(cases.len());

    for case in cases {
        let response = engine.search(&case.query, corpus, k)?;
        let top: Vec<ScoreResult> = response
            .items
            .into_iter()
            .map(|item| ScoreResult {
                series_id: item.series_id,
                score: item.score,
                rank: item.rank,
            })
            .collect();
        let retrieved: Vec<String> = top.iter().map(|r| r.series_id.clone()).collect();

        let (max_score, avg_score, min_score) = if top.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            let scores = top.iter().map(|r| r.score);
            (
                scores.clone().fold(f64::NEG_INFINITY, f64::max),
                scores.clone().sum::<f64>() / top.len() as f64,
                scores.fold(f64::INFINITY, f64::min),
            )
        };
        let (lo, hi) = case.expected_score_range;
        let in_range = !top.is_empty() && lo <= max_score && max_score <= hi;

        details.push(CaseResult {
            name: case.name.clone(),
            description: case.description.clone(),
            max_score,
            avg_score,
            min_score,
            expected_range: case.expected_score_range,
            in_range,
            precision: precision_at_k(&retrieved, &case.expected_similar, k),
            recall: recall_at_k(&retrieved, &case.expected_similar, k),
            ndcg: ndcg_at_k(&retrieved, &case.expected_similar, k),
            dissimilar_hits: retrieved
                .iter()
                .filter(|id| case.expected_dissimilar.contains(*id))
                .cloned()
                .collect(),
            top,
        });
    }

    let summary = summarize(&details);
    info!(
        total = summary.total,
        passed = summary.passed,
        avg_max_score = summary.avg_max_score,
        "validation finished"
    );
    Ok(ValidationReport {
        summary,
        details,
        generated_at: Utc::now(),
    })
}

fn summarize(details: &[CaseResult]) -> ValidationSummary {
    let n = details.len();
    let mean = |f: fn(&CaseResult) -> f64| {
        if n == 0 {
            0.0
        } else {
            details.iter().map(f).sum::<f64>() / n as f64
        }
    };
    ValidationSummary {
        total: n,
        passed: details.iter().filter(|d| d.in_range).count(),
        avg_max_score: mean(|d| d.max_score),
        avg_avg_score: mean(|d| d.avg_score),
        mean_precision: mean(|d| d.precision),
        mean_ndcg: mean(|d| d.ndcg),
    }
}
