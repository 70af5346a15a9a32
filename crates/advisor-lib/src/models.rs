//! Core data models for the right-sizing advisor

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One usage measurement. CPU series carry millicores, memory series bytes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Distribution summary of a sample set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentileSummary {
    pub average: f64,
    pub p50: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
    pub peak: f64,
    pub min: f64,
}

/// Volatility class of a usage series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatternType {
    Steady,
    Moderate,
    Spiky,
    HighlyVariable,
    Unknown,
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternType::Steady => write!(f, "steady"),
            PatternType::Moderate => write!(f, "moderate"),
            PatternType::Spiky => write!(f, "spiky"),
            PatternType::HighlyVariable => write!(f, "highly-variable"),
            PatternType::Unknown => write!(f, "unknown"),
        }
    }
}

/// Classified usage pattern
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UsagePattern {
    #[serde(rename = "type")]
    pub pattern_type: PatternType,
    /// Coefficient of variation, >= 0
    pub variation: f64,
    /// Classification confidence in [0, 1]
    pub confidence: f64,
}

impl UsagePattern {
    pub fn unknown() -> Self {
        Self {
            pattern_type: PatternType::Unknown,
            variation: 0.0,
            confidence: 0.0,
        }
    }
}

impl Default for UsagePattern {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Linear growth trend of a usage series
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GrowthTrend {
    /// Signed growth in percent per 30-day month
    pub rate_per_month: f64,
    /// R² of the linear fit
    pub confidence: f64,
    pub predicted_3_month: f64,
    pub predicted_6_month: f64,
    pub is_growing: bool,
}

/// Kind of deployment unit owning the pods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkloadKind {
    Deployment,
    StatefulSet,
    DaemonSet,
    Job,
    CronJob,
    ReplicaSet,
    #[serde(other)]
    Unknown,
}

impl WorkloadKind {
    pub const ALL: [WorkloadKind; 7] = [
        WorkloadKind::Deployment,
        WorkloadKind::StatefulSet,
        WorkloadKind::DaemonSet,
        WorkloadKind::Job,
        WorkloadKind::CronJob,
        WorkloadKind::ReplicaSet,
        WorkloadKind::Unknown,
    ];

    /// Resource name used by kubectl
    pub fn kubectl_resource(&self) -> &'static str {
        match self {
            WorkloadKind::Deployment => "deployment",
            WorkloadKind::StatefulSet => "statefulset",
            WorkloadKind::DaemonSet => "daemonset",
            WorkloadKind::Job => "job",
            WorkloadKind::CronJob => "cronjob",
            WorkloadKind::ReplicaSet => "replicaset",
            WorkloadKind::Unknown => "workload",
        }
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkloadKind::Deployment => "Deployment",
            WorkloadKind::StatefulSet => "StatefulSet",
            WorkloadKind::DaemonSet => "DaemonSet",
            WorkloadKind::Job => "Job",
            WorkloadKind::CronJob => "CronJob",
            WorkloadKind::ReplicaSet => "ReplicaSet",
            WorkloadKind::Unknown => "Unknown",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for WorkloadKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "deployment" => WorkloadKind::Deployment,
            "statefulset" => WorkloadKind::StatefulSet,
            "daemonset" => WorkloadKind::DaemonSet,
            "job" => WorkloadKind::Job,
            "cronjob" => WorkloadKind::CronJob,
            "replicaset" => WorkloadKind::ReplicaSet,
            _ => WorkloadKind::Unknown,
        })
    }
}

/// Environment class of a namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Production,
    Staging,
    Development,
    #[serde(other)]
    Unknown,
}

impl Environment {
    pub const ALL: [Environment; 4] = [
        Environment::Production,
        Environment::Staging,
        Environment::Development,
        Environment::Unknown,
    ];

    /// Infer the environment from namespace naming conventions
    pub fn from_namespace(namespace: &str) -> Self {
        let ns = namespace.to_ascii_lowercase();
        let tokens: Vec<&str> = ns.split(['-', '_', '.']).collect();
        let has = |words: &[&str]| tokens.iter().any(|t| words.contains(t));

        if has(&["prod", "production", "prd", "live"]) {
            Environment::Production
        } else if has(&["staging", "stage", "stg", "uat", "preprod"]) {
            Environment::Staging
        } else if has(&["dev", "development", "test", "testing", "sandbox", "qa"]) {
            Environment::Development
        } else {
            Environment::Unknown
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Production => write!(f, "production"),
            Environment::Staging => write!(f, "staging"),
            Environment::Development => write!(f, "development"),
            Environment::Unknown => write!(f, "unknown"),
        }
    }
}

impl FromStr for Environment {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "staging" | "stage" => Environment::Staging,
            "development" | "dev" => Environment::Development,
            _ => Environment::Unknown,
        })
    }
}

/// Risk posture of a workload class
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::Medium => write!(f, "MEDIUM"),
            RiskLevel::High => write!(f, "HIGH"),
        }
    }
}

/// How much sizing risk an environment accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTolerance {
    Low,
    Medium,
    High,
}

/// One logical workload, pre-aggregated across its pods.
///
/// Requested and observed values are means over the workload's pods;
/// building that mean is the caller's job (see `source::ObservationBuilder`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedWorkloadObservation {
    pub namespace: String,
    pub name: String,
    pub workload_kind: WorkloadKind,
    pub environment: Environment,
    pub requested_cpu_millicores: f64,
    pub requested_memory_bytes: f64,
    pub observed_cpu_millicores: f64,
    pub observed_memory_bytes: f64,
    pub has_hpa: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hpa_name: Option<String>,
    pub cpu_pattern: UsagePattern,
    pub memory_pattern: UsagePattern,
    pub cpu_growth: GrowthTrend,
    pub memory_growth: GrowthTrend,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_percentiles: Option<PercentileSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_percentiles: Option<PercentileSummary>,
    /// Sample coverage in [0, 1]
    pub data_quality: f64,
    pub has_sufficient_data: bool,
}

/// What the advisor suggests doing with a workload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationType {
    RightSize,
    ScaleDown,
    NoAction,
}

impl fmt::Display for RecommendationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecommendationType::RightSize => write!(f, "RIGHT_SIZE"),
            RecommendationType::ScaleDown => write!(f, "SCALE_DOWN"),
            RecommendationType::NoAction => write!(f, "NO_ACTION"),
        }
    }
}

impl FromStr for RecommendationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "RIGHT_SIZE" | "RIGHTSIZE" => Ok(RecommendationType::RightSize),
            "SCALE_DOWN" | "SCALEDOWN" => Ok(RecommendationType::ScaleDown),
            "NO_ACTION" | "NOACTION" | "NONE" => Ok(RecommendationType::NoAction),
            _ => Err(format!("unknown recommendation type '{}'", s)),
        }
    }
}

/// Impact or risk rating attached to a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rating {
    #[serde(rename = "NONE")]
    None,
    #[serde(rename = "LOW")]
    Low,
    #[serde(rename = "MEDIUM")]
    Medium,
    #[serde(rename = "HIGH")]
    High,
    #[serde(rename = "N/A")]
    NotApplicable,
}

impl From<RiskLevel> for Rating {
    fn from(level: RiskLevel) -> Self {
        match level {
            RiskLevel::Low => Rating::Low,
            RiskLevel::Medium => Rating::Medium,
            RiskLevel::High => Rating::High,
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rating::None => write!(f, "NONE"),
            Rating::Low => write!(f, "LOW"),
            Rating::Medium => write!(f, "MEDIUM"),
            Rating::High => write!(f, "HIGH"),
            Rating::NotApplicable => write!(f, "N/A"),
        }
    }
}

/// Confidence in a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Low => write!(f, "LOW"),
            Confidence::Medium => write!(f, "MEDIUM"),
            Confidence::High => write!(f, "HIGH"),
        }
    }
}

/// Sizing recommendation for one workload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub recommendation_type: RecommendationType,
    pub current_cpu_millicores: i64,
    pub current_memory_bytes: i64,
    pub recommended_cpu_millicores: i64,
    pub recommended_memory_bytes: i64,
    pub reason: String,
    pub savings_monthly: f64,
    pub impact: Rating,
    pub risk: Rating,
    pub confidence: Confidence,
    pub pattern_info: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_from_namespace() {
        assert_eq!(Environment::from_namespace("payments-prod"), Environment::Production);
        assert_eq!(Environment::from_namespace("production"), Environment::Production);
        assert_eq!(Environment::from_namespace("web-staging"), Environment::Staging);
        assert_eq!(Environment::from_namespace("team_dev"), Environment::Development);
        assert_eq!(Environment::from_namespace("default"), Environment::Unknown);
        // substring matches don't count, only whole tokens
        assert_eq!(Environment::from_namespace("products"), Environment::Unknown);
    }

    #[test]
    fn test_unknown_workload_kind_parses_to_unknown() {
        assert_eq!("Deployment".parse::<WorkloadKind>().unwrap(), WorkloadKind::Deployment);
        assert_eq!("cronjob".parse::<WorkloadKind>().unwrap(), WorkloadKind::CronJob);
        assert_eq!("Rollout".parse::<WorkloadKind>().unwrap(), WorkloadKind::Unknown);

        let kind: WorkloadKind = serde_json::from_str("\"Rollout\"").unwrap();
        assert_eq!(kind, WorkloadKind::Unknown);
    }

    #[test]
    fn test_rating_serializes_not_applicable() {
        assert_eq!(serde_json::to_string(&Rating::NotApplicable).unwrap(), "\"N/A\"");
        assert_eq!(Rating::from(RiskLevel::Medium), Rating::Medium);
    }

    #[test]
    fn test_recommendation_type_round_trips_text() {
        assert_eq!(
            "right-size".parse::<RecommendationType>().unwrap(),
            RecommendationType::RightSize
        );
        assert_eq!(RecommendationType::ScaleDown.to_string(), "SCALE_DOWN");
        assert!("resize".parse::<RecommendationType>().is_err());
        assert_eq!(
            serde_json::to_string(&PatternType::HighlyVariable).unwrap(),
            "\"highly-variable\""
        );
    }
}
