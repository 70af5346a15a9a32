//! Per-pod samples to per-workload observations

use super::snapshot::{PodUsage, WorkloadSnapshot};
use crate::analysis::{classify_pattern, compute_percentiles, estimate_growth, mean};
use crate::error::{AdvisorError, Result};
use crate::models::{AggregatedWorkloadObservation, Environment, GrowthTrend, Sample};
use crate::policy::PolicyTables;
use std::sync::Arc;
use tracing::debug;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Collection window the samples were taken over
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingWindow {
    pub window_secs: f64,
    pub step_secs: f64,
}

impl SamplingWindow {
    pub fn new(window_secs: f64, step_secs: f64) -> Self {
        Self {
            window_secs,
            step_secs,
        }
    }

    /// Samples one pod should yield per resource
    pub fn expected_per_pod(&self) -> f64 {
        if self.step_secs <= 0.0 {
            return 0.0;
        }
        (self.window_secs / self.step_secs).floor()
    }
}

/// Builds observations using the policy tables for data sufficiency
pub struct ObservationBuilder {
    policies: Arc<PolicyTables>,
    window: SamplingWindow,
}

impl ObservationBuilder {
    pub fn new(policies: Arc<PolicyTables>, window: SamplingWindow) -> Self {
        Self { policies, window }
    }

    pub fn build(&self, workload: &WorkloadSnapshot) -> Result<AggregatedWorkloadObservation> {
        if workload.pods.is_empty() {
            return Err(AdvisorError::Snapshot(format!(
                "workload {}/{} has no pods",
                workload.namespace, workload.name
            )));
        }

        let requested_cpu = mean(&collect(workload, |p| p.cpu_request_millicores));
        let requested_memory = mean(&collect(workload, |p| p.memory_request_bytes));

        let cpu_series = merged_series(workload, |p| &p.cpu_samples);
        let memory_series = merged_series(workload, |p| &p.memory_samples);
        // a resource without samples has unknown usage, not zero usage
        if cpu_series.is_empty() || memory_series.is_empty() {
            debug!(
                namespace = %workload.namespace,
                name = %workload.name,
                cpu_samples = cpu_series.len(),
                memory_samples = memory_series.len(),
                "Missing usage samples"
            );
            return Err(AdvisorError::EmptyInput);
        }

        let observed_cpu = mean_of_pod_averages(workload, |p| &p.cpu_samples);
        let observed_memory = mean_of_pod_averages(workload, |p| &p.memory_samples);

        let environment = workload
            .environment
            .unwrap_or_else(|| Environment::from_namespace(&workload.namespace));

        let required_days = self.policies.required_data_days(workload.kind, environment);
        let span_days = observed_span_secs(&cpu_series, &memory_series) / SECONDS_PER_DAY;

        let hpa_name = workload.hpa_name.clone().filter(|n| !n.trim().is_empty());

        Ok(AggregatedWorkloadObservation {
            namespace: workload.namespace.clone(),
            name: workload.name.clone(),
            workload_kind: workload.kind,
            environment,
            requested_cpu_millicores: requested_cpu,
            requested_memory_bytes: requested_memory,
            observed_cpu_millicores: observed_cpu,
            observed_memory_bytes: observed_memory,
            has_hpa: hpa_name.is_some(),
            hpa_name,
            cpu_pattern: classify_pattern(&cpu_series),
            memory_pattern: classify_pattern(&memory_series),
            cpu_growth: growth_or_flat(&cpu_series, workload, "cpu"),
            memory_growth: growth_or_flat(&memory_series, workload, "memory"),
            cpu_percentiles: compute_percentiles(&cpu_series).ok(),
            memory_percentiles: compute_percentiles(&memory_series).ok(),
            data_quality: self.data_quality(workload, cpu_series.len(), memory_series.len()),
            has_sufficient_data: span_days >= f64::from(required_days),
        })
    }

    /// Mean of CPU and memory sample coverage, each capped at 1
    fn data_quality(&self, workload: &WorkloadSnapshot, cpu: usize, memory: usize) -> f64 {
        let expected = workload.pods.len() as f64 * self.window.expected_per_pod();
        if expected <= 0.0 {
            return 0.0;
        }
        let coverage = |n: usize| (n as f64 / expected).min(1.0);
        (coverage(cpu) + coverage(memory)) / 2.0
    }
}

fn collect<F>(workload: &WorkloadSnapshot, field: F) -> Vec<f64>
where
    F: Fn(&PodUsage) -> f64,
{
    workload.pods.iter().map(field).collect()
}

/// All pods' samples in timestamp order
fn merged_series<F>(workload: &WorkloadSnapshot, series: F) -> Vec<Sample>
where
    F: Fn(&PodUsage) -> &Vec<Sample>,
{
    let mut merged: Vec<Sample> = workload
        .pods
        .iter()
        .flat_map(|p| series(p).iter().cloned())
        .collect();
    merged.sort_by_key(|s| s.timestamp);
    merged
}

/// Pods without samples do not count toward the mean
fn mean_of_pod_averages<F>(workload: &WorkloadSnapshot, series: F) -> f64
where
    F: Fn(&PodUsage) -> &Vec<Sample>,
{
    let averages: Vec<f64> = workload
        .pods
        .iter()
        .map(|p| series(p))
        .filter(|s| !s.is_empty())
        .map(|s| s.iter().map(|x| x.value).sum::<f64>() / s.len() as f64)
        .collect();
    mean(&averages)
}

fn observed_span_secs(cpu: &[Sample], memory: &[Sample]) -> f64 {
    let first = cpu.first().into_iter().chain(memory.first()).map(|s| s.timestamp).min();
    let last = cpu.last().into_iter().chain(memory.last()).map(|s| s.timestamp).max();
    match (first, last) {
        (Some(first), Some(last)) => (last - first).num_seconds() as f64,
        _ => 0.0,
    }
}

fn growth_or_flat(series: &[Sample], workload: &WorkloadSnapshot, resource: &str) -> GrowthTrend {
    match estimate_growth(series) {
        Ok(trend) => trend,
        Err(e) => {
            debug!(
                namespace = %workload.namespace,
                name = %workload.name,
                resource,
                error = %e,
                "No growth trend"
            );
            GrowthTrend::default()
        }
    }
}
