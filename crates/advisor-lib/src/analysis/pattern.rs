//! Usage pattern classification
//!
//! Labels a series by its coefficient of variation. Confidence drops as
//! variability rises since volatile series compress poorly into one request.

use super::stats::coefficient_of_variation;
use crate::models::{PatternType, Sample, UsagePattern};

/// Minimum samples required before a pattern is classified
pub const MIN_PATTERN_SAMPLES: usize = 10;

/// (upper CV bound, pattern, confidence), evaluated in order
const THRESHOLDS: [(f64, PatternType, f64); 3] = [
    (0.15, PatternType::Steady, 0.95),
    (0.35, PatternType::Moderate, 0.85),
    (0.70, PatternType::Spiky, 0.80),
];

const HIGHLY_VARIABLE_CONFIDENCE: f64 = 0.75;

/// Classify a series as steady, moderate, spiky or highly-variable.
///
/// Fewer than `MIN_PATTERN_SAMPLES` samples yields the unknown pattern.
pub fn classify_pattern(samples: &[Sample]) -> UsagePattern {
    if samples.len() < MIN_PATTERN_SAMPLES {
        return UsagePattern::unknown();
    }

    let variation = coefficient_of_variation(samples);
    let (pattern_type, confidence) = THRESHOLDS
        .iter()
        .find(|(bound, _, _)| variation < *bound)
        .map(|(_, pattern, confidence)| (*pattern, *confidence))
        .unwrap_or((PatternType::HighlyVariable, HIGHLY_VARIABLE_CONFIDENCE));

    UsagePattern {
        pattern_type,
        variation,
        confidence,
    }
}
