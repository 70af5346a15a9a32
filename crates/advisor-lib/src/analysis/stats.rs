//! Descriptive statistics over usage samples

use crate::error::{AdvisorError, Result};
use crate::models::{PercentileSummary, Sample};

/// Summarize a sample set into average, percentiles, min and peak.
///
/// Values are sorted first, so the result does not depend on input order.
pub fn compute_percentiles(samples: &[Sample]) -> Result<PercentileSummary> {
    if samples.is_empty() {
        return Err(AdvisorError::EmptyInput);
    }

    let values = sorted_values(samples);
    let n = values.len();

    Ok(PercentileSummary {
        average: mean(&values),
        p50: percentile(&values, 50.0),
        p90: percentile(&values, 90.0),
        p95: percentile(&values, 95.0),
        p99: percentile(&values, 99.0),
        peak: values[n - 1],
        min: values[0],
    })
}

/// Linearly interpolated percentile over ascending values.
///
/// `p` is in 0-100. Returns 0.0 for an empty slice.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }

    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;

    if lo == hi {
        return sorted[lo];
    }

    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

/// Population coefficient of variation (stddev / mean).
///
/// Zero for fewer than two samples or a zero mean.
pub fn coefficient_of_variation(samples: &[Sample]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }

    let values: Vec<f64> = samples.iter().map(|s| s.value).collect();
    let avg = mean(&values);
    if avg == 0.0 {
        return 0.0;
    }

    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt() / avg
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn sorted_values(samples: &[Sample]) -> Vec<f64> {
    let mut values: Vec<f64> = samples.iter().map(|s| s.value).collect();
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn samples(values: &[f64]) -> Vec<Sample> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| Sample::new(start + Duration::minutes(5 * i as i64), *v))
            .collect()
    }

    #[test]
    fn test_percentiles_one_to_ten() {
        let values: Vec<f64> = (1..=10).map(|v| v as f64).collect();
        let summary = compute_percentiles(&samples(&values)).unwrap();

        assert!((summary.average - 5.5).abs() < 1e-9);
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.peak, 10.0);
        assert!((summary.p50 - 5.5).abs() < 0.5, "p50 was {}", summary.p50);
        assert!((summary.p95 - 9.55).abs() < 0.1, "p95 was {}", summary.p95);
    }

    #[test]
    fn test_percentiles_independent_of_order() {
        let forward = compute_percentiles(&samples(&[3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0])).unwrap();
        let reversed = compute_percentiles(&samples(&[6.0, 2.0, 9.0, 5.0, 1.0, 4.0, 1.0, 3.0])).unwrap();
        assert_eq!(forward, reversed);
    }

    #[test]
    fn test_percentiles_are_ordered() {
        let values: Vec<f64> = (0..57).map(|i| ((i * 37) % 23) as f64 * 1.7).collect();
        let s = compute_percentiles(&samples(&values)).unwrap();
        assert!(s.min <= s.p50);
        assert!(s.p50 <= s.p90);
        assert!(s.p90 <= s.p95);
        assert!(s.p95 <= s.p99);
        assert!(s.p99 <= s.peak);
    }

    #[test]
    fn test_single_sample_returns_value_everywhere() {
        let s = compute_percentiles(&samples(&[42.0])).unwrap();
        assert_eq!(s.min, 42.0);
        assert_eq!(s.p50, 42.0);
        assert_eq!(s.p99, 42.0);
        assert_eq!(s.peak, 42.0);
        assert_eq!(s.average, 42.0);
    }

    #[test]
    fn test_empty_input_fails() {
        assert!(matches!(compute_percentiles(&[]), Err(AdvisorError::EmptyInput)));
    }

    #[test]
    fn test_coefficient_of_variation() {
        // population stddev of [2,4,4,4,5,5,7,9] is exactly 2, mean is 5
        let cv = coefficient_of_variation(&samples(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]));
        assert!((cv - 0.4).abs() < 1e-9);

        assert_eq!(coefficient_of_variation(&samples(&[7.0])), 0.0);
        assert_eq!(coefficient_of_variation(&samples(&[0.0, 0.0, 0.0])), 0.0);
    }
}
