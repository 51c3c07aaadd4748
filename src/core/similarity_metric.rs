use tracing::debug;

/// Reason a metric declined to produce a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degeneracy {
    /// An input contained NaN or an infinity.
    NonFinite,
    /// An input had (near-)zero variance.
    LowVariance,
    /// An input vector had (near-)zero L2 norm.
    ZeroNorm,
    /// Inputs were empty or of different lengths.
    Shape,
}

/// Outcome of a single similarity or distance computation.
///
/// Metrics never fail. When the numbers do not support a meaningful answer
/// they report `Degenerate`, and callers collapse that to the neutral value
/// through [`SimilarityMetric::evaluate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measure {
    Value(f64),
    Degenerate(Degeneracy),
}

impl Measure {
    /// The finite value, if any.
    pub fn value(self) -> Option<f64> {
        match self {
            Measure::Value(v) if v.is_finite() => Some(v),
            _ => None,
        }
    }

    pub fn is_degenerate(self) -> bool {
        self.value().is_none()
    }

    /// Collapse to a plain number: degenerate and non-finite results become `0.0`.
    pub fn or_neutral(self) -> f64 {
        self.value().unwrap_or(0.0)
    }
}

/// Trait for pairwise similarity signals between two equal-length sequences.
///
/// Implementations are small config-carrying values; scorers hold them by
/// value and are generic over them, so the per-row inner loop monomorphizes.
pub trait SimilarityMetric: Clone + Send + Sync {
    /// Short name used in log events.
    const NAME: &'static str;

    /// Compute the raw signal, reporting degeneracy explicitly.
    fn measure(&self, a: &[f64], b: &[f64]) -> Measure;

    /// Compute the signal and collapse degeneracy to the neutral `0.0`.
    fn evaluate(&self, a: &[f64], b: &[f64]) -> f64 {
        collapse(Self::NAME, self.measure(a, b))
    }
}

/// Collapse a measure to a plain number, logging why a neutral value was used.
pub(crate) fn collapse(metric: &'static str, measure: Measure) -> f64 {
    match measure {
        Measure::Value(v) if v.is_finite() => v,
        Measure::Value(v) => {
            debug!(metric, value = v, "non-finite metric output, using 0.0");
            0.0
        }
        Measure::Degenerate(reason) => {
            debug!(metric, ?reason, "degenerate metric input, using 0.0");
            0.0
        }
    }
}

/// Shared shape and finiteness pre-check for metric inputs.
pub(crate) fn check_inputs(a: &[f64], b: &[f64]) -> Option<Degeneracy> {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return Some(Degeneracy::Shape);
    }
    if a.iter().chain(b).any(|x| !x.is_finite()) {
        return Some(Degeneracy::NonFinite);
    }
    None
}
