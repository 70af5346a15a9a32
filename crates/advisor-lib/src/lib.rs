//! Right-sizing advisor library
//!
//! This crate provides the core functionality for:
//! - Usage statistics, pattern classification and growth trends
//! - Workload and environment sizing policies
//! - Recommendation decisions and cost deltas
//! - Snapshot sample sources
//! - Health checks and observability

pub mod analysis;
pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod policy;
pub mod recommender;
pub mod source;

pub use error::{AdvisorError, Result};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{AdvisorMetrics, StructuredLogger};
pub use policy::PolicyTables;
pub use recommender::{
    CloudProvider, CostInfo, CostInfoProvider, Recommender, RecommenderConfig, ScanReport,
    Scanner, StaticPricing, WorkloadRecommendation,
};
pub use source::{SampleSource, Snapshot, SnapshotFileSource, WorkloadSnapshot};
