use thiserror::Error;

/// Errors surfaced by the engine.
///
/// Only structural problems end up here. Numeric degeneracy (constant input,
/// NaN samples, zero-norm vectors) is never an error: it degrades to a neutral
/// value inside the normalizer and the metrics.
#[derive(Debug, Error)]
pub enum SketchError {
    #[error("insufficient data for {context}: need at least {need} points, got {got}")]
    InsufficientData {
        context: &'static str,
        need: usize,
        got: usize,
    },

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("length mismatch in {context}: expected {expected}, got {got}")]
    LengthMismatch {
        context: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SketchError>;

impl SketchError {
    pub(crate) fn insufficient(context: &'static str, need: usize, got: usize) -> Self {
        Self::InsufficientData { context, need, got }
    }

    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
