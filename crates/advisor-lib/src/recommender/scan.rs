//! Batch scanning and ranking
//!
//! Each workload is sized independently; the report is the ranked
//! concatenation of the per-workload results plus totals.

use super::cost::{monthly_cost, CostInfo, CostInfoProvider};
use super::decision::{Recommender, RecommenderConfig};
use crate::models::{
    AggregatedWorkloadObservation, Environment, Recommendation, RecommendationType, WorkloadKind,
};
use crate::policy::PolicyTables;
use crate::source::{ObservationBuilder, Snapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, warn};

const MIB: i64 = 1024 * 1024;

/// A recommendation tagged with the workload it belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadRecommendation {
    pub namespace: String,
    pub name: String,
    pub workload_kind: WorkloadKind,
    pub environment: Environment,
    #[serde(flatten)]
    pub recommendation: Recommendation,
    pub current_monthly_cost: f64,
    pub recommended_monthly_cost: f64,
}

impl WorkloadRecommendation {
    pub fn new(
        obs: &AggregatedWorkloadObservation,
        recommendation: Recommendation,
        cost: &CostInfo,
    ) -> Self {
        let current_monthly_cost = monthly_cost(
            recommendation.current_cpu_millicores,
            recommendation.current_memory_bytes,
            cost,
        );
        let recommended_monthly_cost = monthly_cost(
            recommendation.recommended_cpu_millicores,
            recommendation.recommended_memory_bytes,
            cost,
        );

        Self {
            namespace: obs.namespace.clone(),
            name: obs.name.clone(),
            workload_kind: obs.workload_kind,
            environment: obs.environment,
            recommendation,
            current_monthly_cost,
            recommended_monthly_cost,
        }
    }

    /// `namespace/name`
    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }

    /// Operator command implementing the recommendation.
    ///
    /// Advisory text only; nothing here touches the cluster.
    pub fn advisory_command(&self) -> Option<String> {
        let target = format!("{}/{}", self.workload_kind.kubectl_resource(), self.name);
        let rec = &self.recommendation;

        match rec.recommendation_type {
            RecommendationType::RightSize => Some(format!(
                "kubectl set resources {} -n {} --requests=cpu={}m,memory={}Mi",
                target,
                self.namespace,
                rec.recommended_cpu_millicores,
                mebibytes_rounded_up(rec.recommended_memory_bytes)
            )),
            RecommendationType::ScaleDown => match self.workload_kind {
                WorkloadKind::Deployment | WorkloadKind::StatefulSet | WorkloadKind::ReplicaSet => {
                    Some(format!("kubectl scale {} -n {} --replicas=0", target, self.namespace))
                }
                WorkloadKind::CronJob => Some(format!(
                    "kubectl patch {} -n {} -p '{{\"spec\":{{\"suspend\":true}}}}'",
                    target, self.namespace
                )),
                _ => None,
            },
            RecommendationType::NoAction => None,
        }
    }
}

fn mebibytes_rounded_up(bytes: i64) -> i64 {
    bytes / MIB + i64::from(bytes % MIB != 0)
}

/// A workload that could not be turned into an observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedWorkload {
    pub namespace: String,
    pub name: String,
    pub reason: String,
}

/// Totals over a set of recommendations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub workloads_analyzed: usize,
    pub right_size: usize,
    pub scale_down: usize,
    pub no_action: usize,
    pub current_monthly_cost: f64,
    pub recommended_monthly_cost: f64,
    pub potential_savings: f64,
}

impl ScanSummary {
    pub fn from_recommendations<'a>(
        recs: impl IntoIterator<Item = &'a WorkloadRecommendation>,
    ) -> Self {
        let mut summary = ScanSummary::default();
        for rec in recs {
            summary.workloads_analyzed += 1;
            match rec.recommendation.recommendation_type {
                RecommendationType::RightSize => summary.right_size += 1,
                RecommendationType::ScaleDown => summary.scale_down += 1,
                RecommendationType::NoAction => summary.no_action += 1,
            }
            summary.current_monthly_cost += rec.current_monthly_cost;
            summary.recommended_monthly_cost += rec.recommended_monthly_cost;
            summary.potential_savings += rec.recommendation.savings_monthly;
        }
        summary
    }
}

/// Cost view of a scan, optionally restricted to one namespace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostAnalysis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub workload_count: usize,
    pub current_monthly_cost: f64,
    pub recommended_monthly_cost: f64,
    pub potential_savings: f64,
    pub currency: String,
    pub last_updated: DateTime<Utc>,
}

/// Recommendations returned by the advisor API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationList {
    pub recommendations: Vec<WorkloadRecommendation>,
    pub total: usize,
    pub currency: String,
    pub generated_at: DateTime<Utc>,
}

/// Result of one scan cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub generated_at: DateTime<Utc>,
    pub region: String,
    pub currency: String,
    /// True when default rates replaced unavailable pricing
    pub pricing_fallback: bool,
    pub summary: ScanSummary,
    pub recommendations: Vec<WorkloadRecommendation>,
    pub skipped: Vec<SkippedWorkload>,
}

impl ScanReport {
    /// Recommendations matching optional namespace and type filters, in rank order
    pub fn filtered(
        &self,
        namespace: Option<&str>,
        recommendation_type: Option<RecommendationType>,
    ) -> Vec<&WorkloadRecommendation> {
        self.recommendations
            .iter()
            .filter(|r| namespace.map(|ns| r.namespace == ns).unwrap_or(true))
            .filter(|r| {
                recommendation_type
                    .map(|t| r.recommendation.recommendation_type == t)
                    .unwrap_or(true)
            })
            .collect()
    }

    pub fn find(&self, namespace: &str, name: &str) -> Option<&WorkloadRecommendation> {
        self.recommendations
            .iter()
            .find(|r| r.namespace == namespace && r.name == name)
    }

    pub fn recommendation_list(
        &self,
        namespace: Option<&str>,
        recommendation_type: Option<RecommendationType>,
    ) -> RecommendationList {
        let recommendations: Vec<WorkloadRecommendation> = self
            .filtered(namespace, recommendation_type)
            .into_iter()
            .cloned()
            .collect();
        RecommendationList {
            total: recommendations.len(),
            recommendations,
            currency: self.currency.clone(),
            generated_at: self.generated_at,
        }
    }

    pub fn cost_analysis(&self, namespace: Option<&str>) -> CostAnalysis {
        let summary = ScanSummary::from_recommendations(self.filtered(namespace, None));
        CostAnalysis {
            namespace: namespace.map(str::to_string),
            workload_count: summary.workloads_analyzed,
            current_monthly_cost: summary.current_monthly_cost,
            recommended_monthly_cost: summary.recommended_monthly_cost,
            potential_savings: summary.potential_savings,
            currency: self.currency.clone(),
            last_updated: self.generated_at,
        }
    }
}

/// Order by savings (highest first), then namespace and name
pub fn rank(recs: &mut [WorkloadRecommendation]) {
    recs.sort_by(|a, b| {
        b.recommendation
            .savings_monthly
            .partial_cmp(&a.recommendation.savings_monthly)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.namespace.cmp(&b.namespace))
            .then_with(|| a.name.cmp(&b.name))
    });
}

/// Sizes every workload of a snapshot
#[derive(Debug, Clone)]
pub struct Scanner {
    policies: Arc<PolicyTables>,
    recommender: Recommender,
}

impl Scanner {
    pub fn new(policies: Arc<PolicyTables>, config: RecommenderConfig, region: impl Into<String>) -> Self {
        let recommender = Recommender::new(policies.clone(), region).with_config(config);
        Self {
            policies,
            recommender,
        }
    }

    pub fn recommender(&self) -> &Recommender {
        &self.recommender
    }

    /// Scan a snapshot against one pricing snapshot.
    ///
    /// Prices are resolved once so every workload in the report is costed
    /// with the same rates.
    pub fn scan(&self, snapshot: &Snapshot, pricing: &dyn CostInfoProvider) -> ScanReport {
        let region = self.recommender.region();
        let (cost, pricing_fallback) = match pricing.cost_info(region) {
            Ok(info) => (info, false),
            Err(e) => {
                warn!(region = %region, error = %e, "Pricing unavailable, using default rates");
                (CostInfo::default(), true)
            }
        };

        let builder = ObservationBuilder::new(self.policies.clone(), snapshot.sampling_window());
        let mut recommendations = Vec::with_capacity(snapshot.workloads.len());
        let mut skipped = Vec::new();

        for workload in &snapshot.workloads {
            match builder.build(workload) {
                Ok(obs) => {
                    let rec = self.recommender.recommend(&obs, &cost);
                    recommendations.push(WorkloadRecommendation::new(&obs, rec, &cost));
                }
                Err(e) => {
                    debug!(
                        namespace = %workload.namespace,
                        name = %workload.name,
                        error = %e,
                        "Skipping workload"
                    );
                    skipped.push(SkippedWorkload {
                        namespace: workload.namespace.clone(),
                        name: workload.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        rank(&mut recommendations);

        ScanReport {
            generated_at: Utc::now(),
            region: region.to_string(),
            currency: cost.currency.clone(),
            pricing_fallback,
            summary: ScanSummary::from_recommendations(&recommendations),
            recommendations,
            skipped,
        }
    }
}
