//! Usage inputs for the advisor
//!
//! This module provides:
//! - The snapshot interchange format produced by an external collector
//! - A file-backed sample source
//! - Aggregation of per-pod samples into one observation per workload

mod aggregate;
mod snapshot;

pub use aggregate::{ObservationBuilder, SamplingWindow};
pub use snapshot::{PodUsage, Snapshot, SnapshotFileSource, WorkloadSnapshot};

use crate::error::Result;

pub use async_trait::async_trait;

/// Trait for sample source implementations
///
/// Sources must hand over complete sample sets or an error; the engine
/// never consumes a partial stream.
#[async_trait]
pub trait SampleSource: Send + Sync {
    /// Fetch the current snapshot of all workloads
    async fn snapshot(&self) -> Result<Snapshot>;

    /// Human-readable description for logs
    fn describe(&self) -> String;
}
