//! Randomized stand-in used when an agent endpoint fails.
//!
//! This only exercises the failure path; it is not a score.

use super::Prediction;
use rand::Rng;

/// Lower bound of placeholder confidence (inclusive).
pub const PLACEHOLDER_MIN_CONFIDENCE: f64 = 0.85;
/// Upper bound of placeholder confidence (exclusive).
pub const PLACEHOLDER_MAX_CONFIDENCE: f64 = 1.0;

/// Draws a `Risk {0-99}%` label and a confidence in `[0.85, 1.0)`.
pub fn placeholder_result<R: Rng + ?Sized>(rng: &mut R) -> Prediction {
    let risk: u32 = rng.gen_range(0..100);
    let confidence = rng.gen_range(PLACEHOLDER_MIN_CONFIDENCE..PLACEHOLDER_MAX_CONFIDENCE);

    Prediction {
        label: format!("Risk {}%", risk),
        confidence,
    }
}
