//! Snapshot interchange format and file source

use super::aggregate::SamplingWindow;
use super::{async_trait, SampleSource};
use crate::error::{AdvisorError, Result};
use crate::models::{Environment, Sample, WorkloadKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default lookback window (7 days)
const DEFAULT_WINDOW_HOURS: f64 = 168.0;

/// Default sample resolution (5 minutes)
const DEFAULT_STEP_SECONDS: u64 = 300;

/// Requests and usage series of one pod
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodUsage {
    pub pod_name: String,
    pub cpu_request_millicores: f64,
    pub memory_request_bytes: f64,
    /// CPU usage in millicores
    #[serde(default)]
    pub cpu_samples: Vec<Sample>,
    /// Memory working set in bytes
    #[serde(default)]
    pub memory_samples: Vec<Sample>,
}

/// All pods of one logical workload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadSnapshot {
    pub namespace: String,
    pub name: String,
    pub kind: WorkloadKind,
    /// Explicit label; inferred from the namespace when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hpa_name: Option<String>,
    pub pods: Vec<PodUsage>,
}

/// One collection cycle's worth of workloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default = "default_window_hours")]
    pub window_hours: f64,
    #[serde(default = "default_step_seconds")]
    pub step_seconds: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collected_at: Option<DateTime<Utc>>,
    pub workloads: Vec<WorkloadSnapshot>,
}

fn default_window_hours() -> f64 {
    DEFAULT_WINDOW_HOURS
}

fn default_step_seconds() -> u64 {
    DEFAULT_STEP_SECONDS
}

impl Snapshot {
    pub fn new(workloads: Vec<WorkloadSnapshot>) -> Self {
        Self {
            window_hours: DEFAULT_WINDOW_HOURS,
            step_seconds: DEFAULT_STEP_SECONDS,
            collected_at: None,
            workloads,
        }
    }

    /// Parse and validate a JSON snapshot
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Read a JSON snapshot from disk
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_json(&content)
    }

    pub fn sampling_window(&self) -> SamplingWindow {
        SamplingWindow::new(self.window_hours * 3600.0, self.step_seconds as f64)
    }

    fn validate(&self) -> Result<()> {
        if !(self.window_hours.is_finite() && self.window_hours > 0.0) {
            return Err(AdvisorError::Snapshot(format!(
                "window_hours must be positive, got {}",
                self.window_hours
            )));
        }
        if self.step_seconds == 0 {
            return Err(AdvisorError::Snapshot("step_seconds must be positive".to_string()));
        }
        for workload in &self.workloads {
            if workload.name.is_empty() || workload.namespace.is_empty() {
                return Err(AdvisorError::Snapshot(
                    "workloads need a namespace and a name".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Sample source reading a snapshot file written by an external collector
#[derive(Debug, Clone)]
pub struct SnapshotFileSource {
    path: PathBuf,
}

impl SnapshotFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SampleSource for SnapshotFileSource {
    async fn snapshot(&self) -> Result<Snapshot> {
        let snapshot = Snapshot::load(&self.path).await?;
        debug!(
            path = %self.path.display(),
            workloads = snapshot.workloads.len(),
            "Loaded snapshot"
        );
        Ok(snapshot)
    }

    fn describe(&self) -> String {
        format!("snapshot file {}", self.path.display())
    }
}
