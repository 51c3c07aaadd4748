use std::f64::consts::PI;
use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::algorithms::normalize::normalize_query;
use crate::core::error::Result;

/// Synthetic sketch shapes with a known ground truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pattern {
    Uptrend,
    Downtrend,
    /// Up to the midpoint, then back down.
    Peak,
    /// Down to the midpoint, then back up.
    Valley,
    /// Two full sine periods.
    Sine,
    Flat,
}

impl Pattern {
    pub const ALL: [Pattern; 6] = [
        Pattern::Uptrend,
        Pattern::Downtrend,
        Pattern::Peak,
        Pattern::Valley,
        Pattern::Sine,
        Pattern::Flat,
    ];

    /// The shapes that carry a trend; `Flat` normalizes to all zeros.
    pub const SHAPED: [Pattern; 5] = [
        Pattern::Uptrend,
        Pattern::Downtrend,
        Pattern::Peak,
        Pattern::Valley,
        Pattern::Sine,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Pattern::Uptrend => "uptrend",
            Pattern::Downtrend => "downtrend",
            Pattern::Peak => "peak",
            Pattern::Valley => "valley",
            Pattern::Sine => "sine",
            Pattern::Flat => "flat",
        }
    }

    /// Raw shape sampled at `length` evenly spaced points of `[0, 1]`, values in `[0, 1]`.
    pub fn raw(self, length: usize) -> Vec<f64> {
        let step = if length > 1 { 1.0 / (length - 1) as f64 } else { 0.0 };
        (0..length)
            .map(|i| {
                let x = i as f64 * step;
                match self {
                    Pattern::Uptrend => x,
                    Pattern::Downtrend => 1.0 - x,
                    Pattern::Peak if x < 0.5 => 2.0 * x,
                    Pattern::Peak => 2.0 * (1.0 - x),
                    Pattern::Valley if x < 0.5 => 1.0 - 2.0 * x,
                    Pattern::Valley => 2.0 * x - 1.0,
                    Pattern::Sine => 0.5 + 0.5 * (4.0 * PI * x).sin(),
                    Pattern::Flat => 0.5,
                }
            })
            .collect()
    }

    /// The shape as a normalized sketch of `length` points.
    pub fn sketch(self, length: usize) -> Result<Vec<f64>> {
        normalize_query(&self.raw(length), length)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Add i.i.d. Gaussian noise with standard deviation `level`.
///
/// The same `seed` always produces the same noise.
pub fn add_noise(values: &[f64], level: f64, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    values.iter().map(|v| v + level * standard_normal(&mut rng)).collect()
}

/// Box-Muller draw from N(0, 1).
fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    // gen::<f64>() is in [0, 1); keep u1 away from 0 for the log.
    let u1 = rng.gen::<f64>().max(f64::MIN_POSITIVE);
    let u2 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}
