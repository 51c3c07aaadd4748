//! Retrieval quality report on synthetic patterns.
//!
//! Searches a corpus of clean pattern shapes with clean and noisy sketches and
//! writes the graded report as JSON to stdout.
//!
//! Run with: cargo run --release --example validation_report [seed]

use sketch_rs::validation::{pattern_corpus, run_validation, standard_cases};
use sketch_rs::EnsembleEngine;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(42);

    let engine = EnsembleEngine::default();
    let corpus = pattern_corpus("MA20", 200).unwrap();
    let cases = standard_cases(200, seed).unwrap();
    let report = run_validation(&engine, &corpus, &cases, 5).unwrap();

    for d in &report.details {
        let status = if d.in_range { "PASS" } else { "FAIL" };
        eprintln!(
            "{status} {:<22} best {:.4} expected {:.1}..{:.1} ndcg {:.3}",
            d.name, d.max_score, d.expected_range.0, d.expected_range.1, d.ndcg
        );
    }
    eprintln!(
        "{}/{} cases in range, mean precision@5 {:.3}",
        report.summary.passed, report.summary.total, report.summary.mean_precision
    );

    println!("{}", report.to_json_pretty().unwrap());
}
