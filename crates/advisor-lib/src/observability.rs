//! Observability for the advisor
//!
//! Provides:
//! - Prometheus metrics (scan latency, workloads analyzed, recommendations by type, savings)
//! - Structured logging of scan and recommendation events with tracing

use crate::models::{Recommendation, RecommendationType};
use crate::recommender::{ScanReport, SkippedWorkload};
use prometheus::{
    register_gauge, register_histogram, register_int_counter, register_int_counter_vec,
    register_int_gauge, Gauge, Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Scan latency buckets (in seconds)
const SCAN_LATENCY_BUCKETS: &[f64] = &[0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<AdvisorMetricsInner> = OnceLock::new();

struct AdvisorMetricsInner {
    scan_latency_seconds: Histogram,
    workloads_analyzed: IntGauge,
    recommendations_total: IntCounterVec,
    potential_savings_monthly: Gauge,
    pricing_fallbacks_total: IntCounter,
    workloads_skipped_total: IntCounter,
    scan_errors_total: IntCounter,
    last_scan_timestamp_seconds: IntGauge,
}

impl AdvisorMetricsInner {
    fn new() -> Self {
        Self {
            scan_latency_seconds: register_histogram!(
                "rightsize_advisor_scan_latency_seconds",
                "Time spent sizing all workloads of a snapshot",
                SCAN_LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register scan_latency_seconds"),

            workloads_analyzed: register_int_gauge!(
                "rightsize_advisor_workloads_analyzed",
                "Workloads sized in the latest scan"
            )
            .expect("Failed to register workloads_analyzed"),

            recommendations_total: register_int_counter_vec!(
                "rightsize_advisor_recommendations_total",
                "Recommendations produced, by type",
                &["type"]
            )
            .expect("Failed to register recommendations_total"),

            potential_savings_monthly: register_gauge!(
                "rightsize_advisor_potential_savings_monthly",
                "Monthly savings available in the latest scan"
            )
            .expect("Failed to register potential_savings_monthly"),

            pricing_fallbacks_total: register_int_counter!(
                "rightsize_advisor_pricing_fallbacks_total",
                "Scans costed with default rates because pricing was unavailable"
            )
            .expect("Failed to register pricing_fallbacks_total"),

            workloads_skipped_total: register_int_counter!(
                "rightsize_advisor_workloads_skipped_total",
                "Workloads skipped for missing or malformed samples"
            )
            .expect("Failed to register workloads_skipped_total"),

            scan_errors_total: register_int_counter!(
                "rightsize_advisor_scan_errors_total",
                "Scans that failed to load a snapshot"
            )
            .expect("Failed to register scan_errors_total"),

            last_scan_timestamp_seconds: register_int_gauge!(
                "rightsize_advisor_last_scan_timestamp_seconds",
                "Unix time of the latest completed scan"
            )
            .expect("Failed to register last_scan_timestamp_seconds"),
        }
    }
}

/// Handle to the global advisor metrics.
///
/// Clones share the same underlying metrics.
#[derive(Clone)]
pub struct AdvisorMetrics {
    _private: (),
}

impl Default for AdvisorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl AdvisorMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(AdvisorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &AdvisorMetricsInner {
        GLOBAL_METRICS.get_or_init(AdvisorMetricsInner::new)
    }

    /// Record everything a finished scan reports
    pub fn record_scan(&self, report: &ScanReport, duration_secs: f64) {
        let inner = self.inner();
        inner.scan_latency_seconds.observe(duration_secs);
        inner
            .workloads_analyzed
            .set(report.summary.workloads_analyzed as i64);
        inner
            .potential_savings_monthly
            .set(report.summary.potential_savings);
        inner
            .workloads_skipped_total
            .inc_by(report.skipped.len() as u64);
        inner
            .last_scan_timestamp_seconds
            .set(report.generated_at.timestamp());

        for rec in &report.recommendations {
            self.inc_recommendation(rec.recommendation.recommendation_type);
        }
        if report.pricing_fallback {
            inner.pricing_fallbacks_total.inc();
        }
    }

    pub fn inc_recommendation(&self, recommendation_type: RecommendationType) {
        self.inner()
            .recommendations_total
            .with_label_values(&[&recommendation_type.to_string()])
            .inc();
    }

    pub fn inc_scan_errors(&self) {
        self.inner().scan_errors_total.inc();
    }
}

/// Structured logger for advisor events
#[derive(Clone)]
pub struct StructuredLogger {
    cluster: String,
}

impl StructuredLogger {
    pub fn new(cluster: impl Into<String>) -> Self {
        Self {
            cluster: cluster.into(),
        }
    }

    pub fn log_startup(&self, version: &str, region: &str, source: &str) {
        info!(
            event = "advisor_started",
            cluster = %self.cluster,
            advisor_version = %version,
            region = %region,
            source = %source,
            "Right-sizing advisor started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "advisor_shutdown",
            cluster = %self.cluster,
            reason = %reason,
            "Right-sizing advisor shutting down"
        );
    }

    pub fn log_scan_completed(&self, report: &ScanReport, duration_secs: f64) {
        info!(
            event = "scan_completed",
            cluster = %self.cluster,
            region = %report.region,
            workloads = report.summary.workloads_analyzed,
            right_size = report.summary.right_size,
            scale_down = report.summary.scale_down,
            no_action = report.summary.no_action,
            skipped = report.skipped.len(),
            potential_savings = report.summary.potential_savings,
            currency = %report.currency,
            duration_secs = duration_secs,
            "Scan completed"
        );
    }

    /// Actionable recommendations log at info, the rest at debug
    pub fn log_recommendation(&self, namespace: &str, name: &str, rec: &Recommendation) {
        match rec.recommendation_type {
            RecommendationType::NoAction => {
                debug!(
                    event = "recommendation_generated",
                    cluster = %self.cluster,
                    namespace = %namespace,
                    name = %name,
                    recommendation_type = %rec.recommendation_type,
                    reason = %rec.reason,
                    "No change recommended"
                );
            }
            _ => {
                info!(
                    event = "recommendation_generated",
                    cluster = %self.cluster,
                    namespace = %namespace,
                    name = %name,
                    recommendation_type = %rec.recommendation_type,
                    current_cpu_millicores = rec.current_cpu_millicores,
                    recommended_cpu_millicores = rec.recommended_cpu_millicores,
                    current_memory_bytes = rec.current_memory_bytes,
                    recommended_memory_bytes = rec.recommended_memory_bytes,
                    savings_monthly = rec.savings_monthly,
                    risk = %rec.risk,
                    confidence = %rec.confidence,
                    "Generated right-sizing recommendation"
                );
            }
        }
    }

    pub fn log_skipped(&self, skipped: &SkippedWorkload) {
        warn!(
            event = "workload_skipped",
            cluster = %self.cluster,
            namespace = %skipped.namespace,
            name = %skipped.name,
            reason = %skipped.reason,
            "Workload skipped"
        );
    }

    pub fn log_pricing_fallback(&self, region: &str) {
        warn!(
            event = "pricing_fallback",
            cluster = %self.cluster,
            region = %region,
            "Pricing unavailable, costs use default rates"
        );
    }

    /// Log every event a scan produced
    pub fn log_report(&self, report: &ScanReport, duration_secs: f64) {
        if report.pricing_fallback {
            self.log_pricing_fallback(&report.region);
        }
        for rec in &report.recommendations {
            self.log_recommendation(&rec.namespace, &rec.name, &rec.recommendation);
        }
        for skipped in &report.skipped {
            self.log_skipped(skipped);
        }
        self.log_scan_completed(report, duration_secs);
    }
}
