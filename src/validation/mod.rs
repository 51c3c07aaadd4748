//! Offline quality checks: synthetic sketches with known answers, graded
//! with standard retrieval metrics.

pub mod harness;
pub mod patterns;
pub mod retrieval;

pub use harness::{
    pattern_corpus, run_validation, standard_cases, CaseResult, ValidationCase, ValidationReport,
    ValidationSummary,
};
pub use patterns::{add_noise, Pattern};
pub use retrieval::{ndcg_at_k, precision_at_k, recall_at_k};
