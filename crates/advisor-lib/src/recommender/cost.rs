//! Monthly cost estimation
//!
//! Converts CPU millicores and memory bytes into a monthly currency figure.
//! Pricing comes from a `CostInfoProvider`; when the provider cannot answer,
//! estimation falls back to fixed default rates instead of failing.

use crate::error::{AdvisorError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Fallback price per CPU core per month (USD)
pub const DEFAULT_CPU_COST_PER_CORE: f64 = 23.0;

/// Fallback price per GiB of memory per month (USD)
pub const DEFAULT_MEM_COST_PER_GIB: f64 = 3.0;

/// Hours in a month (for hourly list prices)
const HOURS_PER_MONTH: f64 = 730.0;

const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Unit prices for one region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostInfo {
    pub cpu_cost_per_core: f64,
    pub mem_cost_per_gib: f64,
    pub currency: String,
}

impl Default for CostInfo {
    fn default() -> Self {
        Self {
            cpu_cost_per_core: DEFAULT_CPU_COST_PER_CORE,
            mem_cost_per_gib: DEFAULT_MEM_COST_PER_GIB,
            currency: "USD".to_string(),
        }
    }
}

/// Source of unit prices per region
pub trait CostInfoProvider: Send + Sync {
    fn cost_info(&self, region: &str) -> Result<CostInfo>;
}

/// A fixed pricing snapshot answers for every region
impl CostInfoProvider for CostInfo {
    fn cost_info(&self, _region: &str) -> Result<CostInfo> {
        Ok(self.clone())
    }
}

/// Monthly cost of a CPU/memory allocation
pub fn monthly_cost(cpu_millicores: i64, memory_bytes: i64, info: &CostInfo) -> f64 {
    (cpu_millicores as f64 / 1000.0) * info.cpu_cost_per_core
        + (memory_bytes as f64 / BYTES_PER_GIB) * info.mem_cost_per_gib
}

/// Ask the provider for prices, falling back to the default rates
pub fn cost_info_or_default(provider: &dyn CostInfoProvider, region: &str) -> CostInfo {
    match provider.cost_info(region) {
        Ok(info) => info,
        Err(e) => {
            warn!(region = %region, error = %e, "Pricing unavailable, using default rates");
            CostInfo::default()
        }
    }
}

/// Cloud provider used to pick list prices
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloudProvider {
    #[default]
    Aws,
    Gcp,
    Azure,
    OnPrem,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for CloudProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloudProvider::Aws => write!(f, "aws"),
            CloudProvider::Gcp => write!(f, "gcp"),
            CloudProvider::Azure => write!(f, "azure"),
            CloudProvider::OnPrem => write!(f, "onprem"),
            CloudProvider::Unknown => write!(f, "unknown"),
        }
    }
}

impl FromStr for CloudProvider {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "aws" | "eks" => CloudProvider::Aws,
            "gcp" | "gke" => CloudProvider::Gcp,
            "azure" | "aks" => CloudProvider::Azure,
            "onprem" | "on-prem" => CloudProvider::OnPrem,
            _ => CloudProvider::Unknown,
        })
    }
}

/// On-demand list prices per provider
///
/// Regions are not priced individually; any non-empty region gets the
/// provider's list price. Unknown providers have no prices.
#[derive(Debug, Clone, Copy)]
pub struct StaticPricing {
    provider: CloudProvider,
}

impl StaticPricing {
    pub fn new(provider: CloudProvider) -> Self {
        Self { provider }
    }

    /// Hourly (per vCPU, per GB) list prices
    fn hourly_rates(&self) -> Option<(f64, f64)> {
        match self.provider {
            CloudProvider::Aws => Some((0.0416, 0.0052)),
            CloudProvider::Gcp => Some((0.0335, 0.0045)),
            CloudProvider::Azure => Some((0.0400, 0.0050)),
            CloudProvider::OnPrem => Some((0.0250, 0.0030)),
            CloudProvider::Unknown => None,
        }
    }
}

impl CostInfoProvider for StaticPricing {
    fn cost_info(&self, region: &str) -> Result<CostInfo> {
        let unavailable = || AdvisorError::PricingUnavailable {
            region: region.to_string(),
        };

        if region.trim().is_empty() {
            return Err(unavailable());
        }

        let (cpu_hourly, mem_hourly) = self.hourly_rates().ok_or_else(unavailable)?;
        Ok(CostInfo {
            cpu_cost_per_core: cpu_hourly * HOURS_PER_MONTH,
            mem_cost_per_gib: mem_hourly * HOURS_PER_MONTH,
            currency: "USD".to_string(),
        })
    }
}
