//! Statistical analysis of usage series
//!
//! This module provides:
//! - Percentile summaries and coefficient of variation
//! - Volatility pattern classification
//! - Linear growth trend estimation

mod pattern;
mod stats;
mod trend;

pub use pattern::{classify_pattern, MIN_PATTERN_SAMPLES};
pub use stats::{coefficient_of_variation, compute_percentiles, mean, percentile};
pub use trend::{
    estimate_growth, fit_linear, LinearFit, GROWTH_RATE_THRESHOLD, MIN_TREND_SAMPLES,
};
