//! Recommendation engine
//!
//! This module provides:
//! - The decision policy turning one observation into a recommendation
//! - Monthly cost estimation with graceful pricing fallback
//! - Scanning, ranking and summarizing a batch of workloads

mod cost;
mod decision;
mod scan;

pub use cost::{
    cost_info_or_default, monthly_cost, CloudProvider, CostInfo, CostInfoProvider,
    StaticPricing, DEFAULT_CPU_COST_PER_CORE, DEFAULT_MEM_COST_PER_GIB,
};
pub use decision::{
    confidence, validate_request, Recommender, RecommenderConfig, MIN_CPU_MILLICORES,
    MIN_MEMORY_BYTES,
};
pub use scan::{
    rank, CostAnalysis, RecommendationList, ScanReport, ScanSummary, Scanner, SkippedWorkload,
    WorkloadRecommendation,
};
