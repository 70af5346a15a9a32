//! Recommendation decision policy
//!
//! Fuses requested resources, observed usage, workload and environment
//! policy, usage pattern, growth trend and autoscaler presence into one
//! typed `Recommendation`. Every branch ends in a valid recommendation;
//! conditions that cannot be sized become `NO_ACTION` with a reason an
//! operator can read.

use super::cost::{cost_info_or_default, monthly_cost, CostInfoProvider};
use crate::error::{AdvisorError, Result};
use crate::models::{
    AggregatedWorkloadObservation, Confidence, GrowthTrend, PatternType, Rating, Recommendation,
    RecommendationType, UsagePattern,
};
use crate::policy::{PolicyTables, MIN_SAFETY_BUFFER};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Minimum recommended CPU in millicores
pub const MIN_CPU_MILLICORES: i64 = 10;

/// Minimum recommended memory in bytes (10 MiB)
pub const MIN_MEMORY_BYTES: i64 = 10 * 1024 * 1024;

/// Tunable thresholds of the decision policy.
///
/// The defaults are empirically chosen; treat them as configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommenderConfig {
    /// CPU utilization below which a workload counts as idle
    pub scale_down_utilization: f64,
    /// CPU or memory reduction (percent) needed before resizing
    pub reduction_threshold_percent: f64,
    /// Smallest monthly saving worth recommending
    pub min_monthly_savings: f64,
    /// Lower clamp of the pattern-adjusted buffer
    pub buffer_floor: f64,
    /// Upper clamp of the pattern-adjusted buffer
    pub buffer_ceiling: f64,
    /// Monthly growth (percent) above which the projection is added
    pub growth_rate_threshold: f64,
    /// Share of the 3-month projection added for growing workloads
    pub growth_projection_weight: f64,
    pub min_cpu_millicores: i64,
    pub min_memory_bytes: i64,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            scale_down_utilization: 0.05,
            reduction_threshold_percent: 25.0,
            min_monthly_savings: 1.0,
            buffer_floor: MIN_SAFETY_BUFFER,
            buffer_ceiling: 3.0,
            growth_rate_threshold: 5.0,
            growth_projection_weight: 0.5,
            min_cpu_millicores: MIN_CPU_MILLICORES,
            min_memory_bytes: MIN_MEMORY_BYTES,
        }
    }
}

/// Turns aggregated observations into recommendations
#[derive(Debug, Clone)]
pub struct Recommender {
    policies: Arc<PolicyTables>,
    config: RecommenderConfig,
    region: String,
}

impl Recommender {
    pub fn new(policies: Arc<PolicyTables>, region: impl Into<String>) -> Self {
        Self {
            policies,
            config: RecommenderConfig::default(),
            region: region.into(),
        }
    }

    pub fn with_config(mut self, config: RecommenderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn policies(&self) -> &PolicyTables {
        &self.policies
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Produce a recommendation for one workload.
    ///
    /// Pure for a given pricing snapshot: identical inputs give identical output.
    pub fn recommend(
        &self,
        obs: &AggregatedWorkloadObservation,
        pricing: &dyn CostInfoProvider,
    ) -> Recommendation {
        let cost = cost_info_or_default(pricing, &self.region);
        let current = Allocation::current(obs);
        let verdict = Verdict {
            current,
            confidence: confidence(obs.data_quality, obs.has_sufficient_data, obs.cpu_pattern.pattern_type),
            pattern_info: pattern_info(obs),
        };

        if obs.has_hpa {
            let reason = match &obs.hpa_name {
                Some(name) if !name.is_empty() => format!("autoscaler-managed (HPA {})", name),
                _ => "autoscaler-managed".to_string(),
            };
            return verdict.hold(reason, Rating::NotApplicable, Rating::NotApplicable);
        }

        let workload_policy = self.policies.workload(obs.workload_kind);
        if !workload_policy.optimize_enabled {
            return verdict.hold(
                format!(
                    "optimization disabled for this workload class ({})",
                    obs.workload_kind
                ),
                Rating::None,
                workload_policy.risk_level.into(),
            );
        }

        if let Err(e) = validate_request(obs) {
            return verdict.hold(e.to_string(), Rating::None, Rating::None);
        }

        let current_cost = monthly_cost(current.cpu_millicores, current.memory_bytes, &cost);
        let cpu_util = obs.observed_cpu_millicores / obs.requested_cpu_millicores;

        if cpu_util < self.config.scale_down_utilization {
            return Recommendation {
                recommendation_type: RecommendationType::ScaleDown,
                current_cpu_millicores: current.cpu_millicores,
                current_memory_bytes: current.memory_bytes,
                recommended_cpu_millicores: 0,
                recommended_memory_bytes: 0,
                reason: format!(
                    "idle: CPU {:.1}% utilized (below {:.0}%), scale to zero",
                    cpu_util * 100.0,
                    self.config.scale_down_utilization * 100.0
                ),
                savings_monthly: current_cost,
                impact: Rating::High,
                risk: workload_policy.risk_level.into(),
                confidence: verdict.confidence,
                pattern_info: verdict.pattern_info,
            };
        }

        let base_buffer = self
            .policies
            .combined_safety_buffer(obs.workload_kind, obs.environment);
        let buffer = self.adjust_for_pattern(base_buffer, &obs.cpu_pattern);

        let mut rec_cpu = obs.observed_cpu_millicores * buffer;
        let mut rec_mem = obs.observed_memory_bytes * buffer;
        if obs.has_sufficient_data {
            rec_cpu = self.adjust_for_growth(rec_cpu, &obs.cpu_growth);
            rec_mem = self.adjust_for_growth(rec_mem, &obs.memory_growth);
        }

        let recommended = Allocation {
            cpu_millicores: (rec_cpu.ceil() as i64).max(self.config.min_cpu_millicores),
            memory_bytes: (rec_mem.ceil() as i64).max(self.config.min_memory_bytes),
        };

        let cpu_reduction = reduction_percent(obs.requested_cpu_millicores, recommended.cpu_millicores);
        let mem_reduction = reduction_percent(obs.requested_memory_bytes, recommended.memory_bytes);
        let threshold = self.config.reduction_threshold_percent;

        if cpu_reduction <= threshold && mem_reduction <= threshold {
            return verdict.hold(
                format!(
                    "allocation appropriate: CPU {:.0}% and memory {:.0}% utilized",
                    cpu_util * 100.0,
                    obs.observed_memory_bytes / obs.requested_memory_bytes * 100.0
                ),
                Rating::None,
                Rating::None,
            );
        }

        let recommended_cost =
            monthly_cost(recommended.cpu_millicores, recommended.memory_bytes, &cost);
        let savings = current_cost - recommended_cost;
        if savings < self.config.min_monthly_savings {
            return verdict.hold(
                format!(
                    "savings below threshold ({:.2} {} per month)",
                    savings, cost.currency
                ),
                Rating::None,
                Rating::None,
            );
        }

        let impact = if savings > 50.0 {
            Rating::High
        } else if savings > 20.0 {
            Rating::Medium
        } else {
            Rating::Low
        };

        let avg_reduction = (cpu_reduction + mem_reduction) / 2.0;
        let risk = if avg_reduction > 75.0 {
            Rating::High
        } else if avg_reduction > 50.0 {
            Rating::Medium
        } else {
            workload_policy.risk_level.into()
        };

        let mut reason = format!(
            "over-provisioned: CPU {:.0}% and memory {:.0}% utilized; requests reduced {:.0}%/{:.0}% with {:.2}x buffer",
            cpu_util * 100.0,
            obs.observed_memory_bytes / obs.requested_memory_bytes * 100.0,
            cpu_reduction,
            mem_reduction,
            buffer
        );
        if obs.has_sufficient_data && self.growth_is_material(&obs.cpu_growth) {
            reason.push_str(&format!(
                "; CPU growing {:.1}%/month, half of 3-month projection added",
                obs.cpu_growth.rate_per_month
            ));
        }
        if self.policies.environment(obs.environment).is_production {
            reason.push_str("; production namespace, roll out gradually");
        }

        Recommendation {
            recommendation_type: RecommendationType::RightSize,
            current_cpu_millicores: current.cpu_millicores,
            current_memory_bytes: current.memory_bytes,
            recommended_cpu_millicores: recommended.cpu_millicores,
            recommended_memory_bytes: recommended.memory_bytes,
            reason,
            savings_monthly: savings,
            impact,
            risk,
            confidence: verdict.confidence,
            pattern_info: verdict.pattern_info,
        }
    }

    /// Scale the buffer by pattern volatility, clamped to the configured range
    pub fn adjust_for_pattern(&self, buffer: f64, pattern: &UsagePattern) -> f64 {
        let multiplier = match pattern.pattern_type {
            PatternType::Steady => 0.90,
            PatternType::Moderate => 1.0,
            PatternType::Spiky => 1.15,
            PatternType::HighlyVariable => 1.25,
            PatternType::Unknown => 1.0,
        };

        let mut adjusted = buffer * multiplier;
        if pattern.variation > 0.5 {
            adjusted *= 1.10;
        }
        adjusted.clamp(self.config.buffer_floor, self.config.buffer_ceiling)
    }

    /// Hedge material growth with a share of the 3-month projection
    pub fn adjust_for_growth(&self, value: f64, growth: &GrowthTrend) -> f64 {
        if self.growth_is_material(growth) {
            value + growth.predicted_3_month * self.config.growth_projection_weight
        } else {
            value
        }
    }

    fn growth_is_material(&self, growth: &GrowthTrend) -> bool {
        growth.is_growing && growth.rate_per_month > self.config.growth_rate_threshold
    }
}

/// Confidence from data coverage and CPU pattern
pub fn confidence(data_quality: f64, has_sufficient_data: bool, pattern: PatternType) -> Confidence {
    if !has_sufficient_data {
        Confidence::Low
    } else if data_quality >= 0.8 && pattern == PatternType::Steady {
        Confidence::High
    } else if data_quality >= 0.6 {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

/// Reject requests the utilization math cannot handle
pub fn validate_request(obs: &AggregatedWorkloadObservation) -> Result<()> {
    let positive = |v: f64| v.is_finite() && v > 0.0;
    let non_negative = |v: f64| v.is_finite() && v >= 0.0;

    if !positive(obs.requested_cpu_millicores) {
        return Err(AdvisorError::InvalidRequest(format!(
            "requested CPU must be positive, got {}m",
            obs.requested_cpu_millicores
        )));
    }
    if !positive(obs.requested_memory_bytes) {
        return Err(AdvisorError::InvalidRequest(format!(
            "requested memory must be positive, got {} bytes",
            obs.requested_memory_bytes
        )));
    }
    if !non_negative(obs.observed_cpu_millicores) || !non_negative(obs.observed_memory_bytes) {
        return Err(AdvisorError::InvalidRequest(
            "observed usage must be finite and non-negative".to_string(),
        ));
    }
    Ok(())
}

fn reduction_percent(requested: f64, recommended: i64) -> f64 {
    (requested - recommended as f64) / requested * 100.0
}

fn pattern_info(obs: &AggregatedWorkloadObservation) -> String {
    let describe = |label: &str, pattern: &UsagePattern, growth: &GrowthTrend| {
        let mut text = format!("{} {} (CV {:.2})", label, pattern.pattern_type, pattern.variation);
        if growth.rate_per_month != 0.0 {
            text.push_str(&format!(", trend {:+.1}%/month", growth.rate_per_month));
        }
        text
    };

    let mut info = format!(
        "{}; {}",
        describe("CPU", &obs.cpu_pattern, &obs.cpu_growth),
        describe("memory", &obs.memory_pattern, &obs.memory_growth)
    );
    if let Some(p) = &obs.cpu_percentiles {
        info.push_str(&format!("; CPU p95 {:.0}m, peak {:.0}m", p.p95, p.peak));
    }
    info
}

/// Integer CPU/memory allocation
#[derive(Debug, Clone, Copy)]
struct Allocation {
    cpu_millicores: i64,
    memory_bytes: i64,
}

impl Allocation {
    fn current(obs: &AggregatedWorkloadObservation) -> Self {
        let whole = |v: f64| if v.is_finite() { v.round() as i64 } else { 0 };
        Self {
            cpu_millicores: whole(obs.requested_cpu_millicores),
            memory_bytes: whole(obs.requested_memory_bytes),
        }
    }
}

/// Shared fields of every outcome for one observation
struct Verdict {
    current: Allocation,
    confidence: Confidence,
    pattern_info: String,
}

impl Verdict {
    /// Keep the current allocation
    fn hold(self, reason: String, impact: Rating, risk: Rating) -> Recommendation {
        Recommendation {
            recommendation_type: RecommendationType::NoAction,
            current_cpu_millicores: self.current.cpu_millicores,
            current_memory_bytes: self.current.memory_bytes,
            recommended_cpu_millicores: self.current.cpu_millicores,
            recommended_memory_bytes: self.current.memory_bytes,
            reason,
            savings_monthly: 0.0,
            impact,
            risk,
            confidence: self.confidence,
            pattern_info: self.pattern_info,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Environment, RiskLevel, WorkloadKind};
    use crate::recommender::CostInfo;
    use crate::policy::WorkloadPolicy;

    const MIB: f64 = 1024.0 * 1024.0;
    const GIB: f64 = 1024.0 * MIB;

    fn steady() -> UsagePattern {
        UsagePattern {
            pattern_type: PatternType::Steady,
            variation: 0.05,
            confidence: 0.95,
        }
    }

    fn observation(cpu_util: f64, mem_util: f64) -> AggregatedWorkloadObservation {
        AggregatedWorkloadObservation {
            namespace: "shop".to_string(),
            name: "checkout".to_string(),
            workload_kind: WorkloadKind::Deployment,
            environment: Environment::Unknown,
            requested_cpu_millicores: 1000.0,
            requested_memory_bytes: GIB,
            observed_cpu_millicores: 1000.0 * cpu_util,
            observed_memory_bytes: GIB * mem_util,
            has_hpa: false,
            hpa_name: None,
            cpu_pattern: steady(),
            memory_pattern: steady(),
            cpu_growth: GrowthTrend::default(),
            memory_growth: GrowthTrend::default(),
            cpu_percentiles: None,
            memory_percentiles: None,
            data_quality: 0.9,
            has_sufficient_data: true,
        }
    }

    fn recommender() -> Recommender {
        Recommender::new(Arc::new(PolicyTables::default()), "us-east-1")
    }

    #[test]
    fn test_right_size_over_provisioned() {
        let rec = recommender().recommend(&observation(0.20, 0.25), &CostInfo::default());

        assert_eq!(rec.recommendation_type, RecommendationType::RightSize);
        assert!(rec.savings_monthly > 0.0);
        assert!(rec.recommended_cpu_millicores >= MIN_CPU_MILLICORES);
        assert!(rec.recommended_memory_bytes >= MIN_MEMORY_BYTES);
        // buffer 1.3 * 1.2 * 0.9 = 1.404, so 200m becomes 281m
        assert_eq!(rec.recommended_cpu_millicores, 281);
        assert_eq!(rec.current_cpu_millicores, 1000);
        assert_eq!(rec.confidence, Confidence::High);
        // avg reduction ~68%
        assert_eq!(rec.risk, Rating::Medium);
        // ~18.5 USD saved
        assert_eq!(rec.impact, Rating::Low);
    }

    #[test]
    fn test_idle_workload_scales_to_zero() {
        let obs = observation(0.02, 0.30);
        let cost = CostInfo::default();
        let rec = recommender().recommend(&obs, &cost);

        assert_eq!(rec.recommendation_type, RecommendationType::ScaleDown);
        assert_eq!(rec.recommended_cpu_millicores, 0);
        assert_eq!(rec.recommended_memory_bytes, 0);
        assert!((rec.savings_monthly - 26.0).abs() < 1e-9);
        assert_eq!(rec.impact, Rating::High);
        assert_eq!(rec.risk, Rating::Low);
    }

    #[test]
    fn test_hpa_always_no_action() {
        for util in [0.01, 0.2, 0.9] {
            let mut obs = observation(util, util);
            obs.has_hpa = true;
            obs.hpa_name = Some("checkout-hpa".to_string());
            let rec = recommender().recommend(&obs, &CostInfo::default());

            assert_eq!(rec.recommendation_type, RecommendationType::NoAction);
            assert_eq!(rec.risk, Rating::NotApplicable);
            assert_eq!(rec.impact, Rating::NotApplicable);
            assert!(rec.reason.starts_with("autoscaler-managed"));
            assert_eq!(rec.recommended_cpu_millicores, rec.current_cpu_millicores);
        }
    }

    #[test]
    fn test_optimization_disabled_for_unknown_kind() {
        let mut obs = observation(0.2, 0.2);
        obs.workload_kind = WorkloadKind::Unknown;
        let rec = recommender().recommend(&obs, &CostInfo::default());

        assert_eq!(rec.recommendation_type, RecommendationType::NoAction);
        assert_eq!(rec.risk, Rating::High);
        assert!(rec.reason.starts_with("optimization disabled"));
    }

    #[test]
    fn test_zero_cpu_request_is_no_action() {
        let mut obs = observation(0.2, 0.2);
        obs.requested_cpu_millicores = 0.0;
        obs.observed_cpu_millicores = 50.0;
        let rec = recommender().recommend(&obs, &CostInfo::default());

        assert_eq!(rec.recommendation_type, RecommendationType::NoAction);
        assert!(rec.reason.contains("invalid resource request"));
        assert_eq!(rec.recommended_cpu_millicores, 0);
        assert_eq!(rec.savings_monthly, 0.0);
    }

    #[test]
    fn test_well_sized_workload_is_appropriate() {
        let rec = recommender().recommend(&observation(0.65, 0.65), &CostInfo::default());
        assert_eq!(rec.recommendation_type, RecommendationType::NoAction);
        assert!(rec.reason.starts_with("allocation appropriate"));
        assert_eq!(rec.recommended_memory_bytes, rec.current_memory_bytes);
    }

    #[test]
    fn test_sub_dollar_savings_reclassified() {
        // 40m requested, 10m used: large reduction but pennies of savings
        let mut obs = observation(0.25, 0.25);
        obs.requested_cpu_millicores = 40.0;
        obs.observed_cpu_millicores = 10.0;
        obs.requested_memory_bytes = 64.0 * MIB;
        obs.observed_memory_bytes = 16.0 * MIB;
        let rec = recommender().recommend(&obs, &CostInfo::default());

        assert_eq!(rec.recommendation_type, RecommendationType::NoAction);
        assert!(rec.reason.starts_with("savings below threshold"));
    }

    #[test]
    fn test_large_reduction_is_high_risk() {
        let rec = recommender().recommend(&observation(0.06, 0.06), &CostInfo::default());
        assert_eq!(rec.recommendation_type, RecommendationType::RightSize);
        assert_eq!(rec.risk, Rating::High);
    }

    #[test]
    fn test_expensive_workload_is_high_impact() {
        let mut obs = observation(0.2, 0.2);
        obs.requested_cpu_millicores = 8000.0;
        obs.observed_cpu_millicores = 1600.0;
        let rec = recommender().recommend(&obs, &CostInfo::default());
        assert_eq!(rec.impact, Rating::High);
    }

    #[test]
    fn test_pattern_adjustment() {
        let r = recommender();
        let mut pattern = steady();
        assert!((r.adjust_for_pattern(2.0, &pattern) - 1.8).abs() < 1e-9);

        pattern.pattern_type = PatternType::Spiky;
        pattern.variation = 0.6;
        assert!((r.adjust_for_pattern(2.0, &pattern) - 2.53).abs() < 1e-9);

        pattern.pattern_type = PatternType::HighlyVariable;
        pattern.variation = 1.2;
        assert_eq!(r.adjust_for_pattern(2.5, &pattern), 3.0);

        pattern.pattern_type = PatternType::Steady;
        pattern.variation = 0.01;
        assert_eq!(r.adjust_for_pattern(1.2, &pattern), MIN_SAFETY_BUFFER);
    }

    #[test]
    fn test_growth_adjustment() {
        let r = recommender();
        let growth = GrowthTrend {
            rate_per_month: 8.0,
            confidence: 0.9,
            predicted_3_month: 400.0,
            predicted_6_month: 500.0,
            is_growing: true,
        };
        assert_eq!(r.adjust_for_growth(300.0, &growth), 500.0);

        // growing, but not materially
        let mild = GrowthTrend {
            rate_per_month: 4.0,
            ..growth
        };
        assert_eq!(r.adjust_for_growth(300.0, &mild), 300.0);
        assert_eq!(r.adjust_for_growth(300.0, &GrowthTrend::default()), 300.0);
    }

    #[test]
    fn test_growth_ignored_without_sufficient_data() {
        let mut obs = observation(0.2, 0.25);
        obs.cpu_growth = GrowthTrend {
            rate_per_month: 20.0,
            confidence: 0.9,
            predicted_3_month: 400.0,
            predicted_6_month: 600.0,
            is_growing: true,
        };
        let with_data = recommender().recommend(&obs, &CostInfo::default());
        obs.has_sufficient_data = false;
        let without_data = recommender().recommend(&obs, &CostInfo::default());

        assert_eq!(with_data.recommended_cpu_millicores, 281 + 200);
        assert_eq!(without_data.recommended_cpu_millicores, 281);
        assert_eq!(without_data.confidence, Confidence::Low);
    }

    #[test]
    fn test_confidence_rules() {
        assert_eq!(confidence(0.95, false, PatternType::Steady), Confidence::Low);
        assert_eq!(confidence(0.85, true, PatternType::Steady), Confidence::High);
        assert_eq!(confidence(0.85, true, PatternType::Spiky), Confidence::Medium);
        assert_eq!(confidence(0.6, true, PatternType::Steady), Confidence::Medium);
        assert_eq!(confidence(0.3, true, PatternType::Steady), Confidence::Low);
    }

    #[test]
    fn test_workload_risk_used_for_moderate_reduction() {
        let tables = PolicyTables::default().with_workload_policy(
            WorkloadKind::Deployment,
            WorkloadPolicy {
                safety_buffer: 1.3,
                min_data_days: 7,
                risk_level: RiskLevel::Medium,
                optimize_enabled: true,
            },
        );
        let r = Recommender::new(Arc::new(tables), "us-east-1");
        // 45% utilization -> ~37% reduction, below the 50% risk band
        let rec = r.recommend(&observation(0.45, 0.45), &CostInfo::default());
        assert_eq!(rec.recommendation_type, RecommendationType::RightSize);
        assert_eq!(rec.risk, Rating::Medium);
    }

    #[test]
    fn test_recommend_is_deterministic() {
        let obs = observation(0.3, 0.2);
        let pricing = CostInfo::default();
        let a = recommender().recommend(&obs, &pricing);
        let b = recommender().recommend(&obs, &pricing);
        assert_eq!(a, b);
        assert_eq!(serde_json::to_vec(&a).unwrap(), serde_json::to_vec(&b).unwrap());
    }
}
