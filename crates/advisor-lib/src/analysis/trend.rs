//! Growth trend estimation
//!
//! Fits an ordinary least-squares line to `(hours since first sample, value)`
//! and reports the slope as a monthly growth rate with 3- and 6-month
//! projections. Single-feature OLS keeps every number explainable in a
//! one-line reason string.

use super::stats::mean;
use crate::error::{AdvisorError, Result};
use crate::models::{GrowthTrend, Sample};

/// Minimum samples for trend estimation (about 8 hours at 5-minute resolution)
pub const MIN_TREND_SAMPLES: usize = 100;

/// Monthly growth (percent) above which a series counts as growing
pub const GROWTH_RATE_THRESHOLD: f64 = 3.0;

const HOURS_PER_MONTH: f64 = 24.0 * 30.0;
const HOURS_3_MONTHS: f64 = 24.0 * 90.0;
const HOURS_6_MONTHS: f64 = 24.0 * 180.0;

/// Result of a least-squares line fit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination, clamped to [0, 1]
    pub r_squared: f64,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Estimate the growth trend of a usage series.
///
/// Fails with `InsufficientData` below `MIN_TREND_SAMPLES`; callers use
/// `GrowthTrend::default()` (all zeros, not growing) in that case.
pub fn estimate_growth(samples: &[Sample]) -> Result<GrowthTrend> {
    if samples.len() < MIN_TREND_SAMPLES {
        return Err(AdvisorError::InsufficientData {
            required: MIN_TREND_SAMPLES,
            actual: samples.len(),
        });
    }

    let t0 = samples[0].timestamp;
    let points: Vec<(f64, f64)> = samples
        .iter()
        .map(|s| {
            let hours = (s.timestamp - t0).num_milliseconds() as f64 / 3_600_000.0;
            (hours, s.value)
        })
        .collect();

    let fit = fit_linear(&points);
    let ys: Vec<f64> = points.iter().map(|(_, y)| *y).collect();
    let average = mean(&ys);

    let rate_per_month = if average > 0.0 {
        fit.slope * HOURS_PER_MONTH / average * 100.0
    } else {
        0.0
    };

    let last_x = points.last().map(|(x, _)| *x).unwrap_or(0.0);
    let project = |ahead_hours: f64| {
        let predicted = fit.predict(last_x + ahead_hours);
        if predicted < 0.0 {
            average
        } else {
            predicted
        }
    };

    Ok(GrowthTrend {
        rate_per_month,
        confidence: fit.r_squared,
        predicted_3_month: project(HOURS_3_MONTHS),
        predicted_6_month: project(HOURS_6_MONTHS),
        is_growing: rate_per_month > GROWTH_RATE_THRESHOLD,
    })
}

/// Ordinary least-squares fit over `(x, y)` points.
///
/// A degenerate x spread yields a flat line through the mean of y with R² 0.
pub fn fit_linear(points: &[(f64, f64)]) -> LinearFit {
    if points.is_empty() {
        return LinearFit {
            slope: 0.0,
            intercept: 0.0,
            r_squared: 0.0,
        };
    }

    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (x, y) in points {
        sxy += (x - mean_x) * (y - mean_y);
        sxx += (x - mean_x).powi(2);
    }

    if sxx == 0.0 {
        return LinearFit {
            slope: 0.0,
            intercept: mean_y,
            r_squared: 0.0,
        };
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;

    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for (x, y) in points {
        ss_res += (y - (slope * x + intercept)).powi(2);
        ss_tot += (y - mean_y).powi(2);
    }

    let r_squared = if ss_tot == 0.0 {
        0.0
    } else {
        (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
    };

    LinearFit {
        slope,
        intercept,
        r_squared,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    /// One sample every 5 minutes
    fn series(count: usize, value: impl Fn(usize) -> f64) -> Vec<Sample> {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        (0..count)
            .map(|i| Sample::new(start + Duration::minutes(5 * i as i64), value(i)))
            .collect()
    }

    #[test]
    fn test_insufficient_samples() {
        let samples = series(99, |i| 100.0 + i as f64);
        match estimate_growth(&samples) {
            Err(AdvisorError::InsufficientData { required, actual }) => {
                assert_eq!(required, 100);
                assert_eq!(actual, 99);
            }
            other => panic!("expected InsufficientData, got {:?}", other),
        }

        let zero = GrowthTrend::default();
        assert_eq!(zero.rate_per_month, 0.0);
        assert!(!zero.is_growing);
    }

    #[test]
    fn test_ten_percent_monthly_growth() {
        // one week of samples, y = 1000 + 0.14 * hours, about 9.96% per month
        let samples = series(7 * 288, |i| 1000.0 + 0.14 * (i as f64 / 12.0));
        let trend = estimate_growth(&samples).unwrap();

        assert!((trend.rate_per_month - 10.0).abs() <= 2.0, "rate was {}", trend.rate_per_month);
        assert!(trend.is_growing);
        assert!(trend.confidence > 0.99);
        assert!(trend.predicted_6_month > trend.predicted_3_month);
    }

    #[test]
    fn test_flat_noisy_series() {
        let samples = series(2016, |i| 1000.0 + ((i * 7) % 11) as f64 - 5.0);
        let trend = estimate_growth(&samples).unwrap();

        assert!(trend.rate_per_month.abs() <= 5.0, "rate was {}", trend.rate_per_month);
        assert!(!trend.is_growing);
    }

    #[test]
    fn test_negative_projection_floors_at_average() {
        // steep decline that would project far below zero
        let samples = series(200, |i| 1000.0 - 4.0 * i as f64);
        let trend = estimate_growth(&samples).unwrap();
        let average = samples.iter().map(|s| s.value).sum::<f64>() / samples.len() as f64;

        assert!(trend.rate_per_month < 0.0);
        assert!(!trend.is_growing);
        assert!((trend.predicted_3_month - average).abs() < 1e-9);
        assert!((trend.predicted_6_month - average).abs() < 1e-9);
    }

    #[test]
    fn test_fit_linear_exact_line() {
        let points: Vec<(f64, f64)> = (0..10).map(|x| (x as f64, 2.0 * x as f64 + 1.0)).collect();
        let fit = fit_linear(&points);
        assert!((fit.slope - 2.0).abs() < 1e-9);
        assert!((fit.intercept - 1.0).abs() < 1e-9);
        assert!((fit.r_squared - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_linear_identical_x() {
        let points = vec![(3.0, 1.0), (3.0, 5.0), (3.0, 9.0)];
        let fit = fit_linear(&points);
        assert_eq!(fit.slope, 0.0);
        assert!((fit.intercept - 5.0).abs() < 1e-9);
        assert_eq!(fit.r_squared, 0.0);
    }

    #[test]
    fn test_fit_linear_constant_y_has_zero_r_squared() {
        let points: Vec<(f64, f64)> = (0..10).map(|x| (x as f64, 7.0)).collect();
        let fit = fit_linear(&points);
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.r_squared, 0.0);
    }
}
