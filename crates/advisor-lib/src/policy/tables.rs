//! Default policy tables and lookups

use crate::models::{Environment, RiskLevel, RiskTolerance, WorkloadKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Minimum combined safety buffer (120% headroom)
pub const MIN_SAFETY_BUFFER: f64 = 1.2;

/// Sizing policy for one workload class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkloadPolicy {
    pub safety_buffer: f64,
    pub min_data_days: u32,
    pub risk_level: RiskLevel,
    pub optimize_enabled: bool,
}

/// Sizing policy for one environment class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentPolicy {
    pub buffer_multiplier: f64,
    pub min_data_days: u32,
    pub risk_tolerance: RiskTolerance,
    pub is_production: bool,
}

/// Used for any workload class missing from the table
pub const CONSERVATIVE_WORKLOAD_POLICY: WorkloadPolicy = WorkloadPolicy {
    safety_buffer: 2.0,
    min_data_days: 14,
    risk_level: RiskLevel::High,
    optimize_enabled: false,
};

/// Used for any environment class missing from the table
pub const CONSERVATIVE_ENVIRONMENT_POLICY: EnvironmentPolicy = EnvironmentPolicy {
    buffer_multiplier: 1.2,
    min_data_days: 7,
    risk_tolerance: RiskTolerance::Medium,
    is_production: false,
};

/// Immutable workload and environment policy tables
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyTables {
    workloads: HashMap<WorkloadKind, WorkloadPolicy>,
    environments: HashMap<Environment, EnvironmentPolicy>,
}

impl PolicyTables {
    /// Tables with no entries; every lookup resolves to the conservative defaults
    pub fn empty() -> Self {
        Self {
            workloads: HashMap::new(),
            environments: HashMap::new(),
        }
    }

    /// Replace the policy for a workload class
    pub fn with_workload_policy(mut self, kind: WorkloadKind, policy: WorkloadPolicy) -> Self {
        self.workloads.insert(kind, policy);
        self
    }

    /// Replace the policy for an environment class
    pub fn with_environment_policy(mut self, env: Environment, policy: EnvironmentPolicy) -> Self {
        self.environments.insert(env, policy);
        self
    }

    pub fn workload(&self, kind: WorkloadKind) -> &WorkloadPolicy {
        self.workloads
            .get(&kind)
            .unwrap_or(&CONSERVATIVE_WORKLOAD_POLICY)
    }

    pub fn environment(&self, env: Environment) -> &EnvironmentPolicy {
        self.environments
            .get(&env)
            .unwrap_or(&CONSERVATIVE_ENVIRONMENT_POLICY)
    }

    /// Workload buffer scaled by the environment multiplier, never below 1.2
    pub fn combined_safety_buffer(&self, kind: WorkloadKind, env: Environment) -> f64 {
        let buffer = self.workload(kind).safety_buffer * self.environment(env).buffer_multiplier;
        buffer.max(MIN_SAFETY_BUFFER)
    }

    /// Days of history both policies require before trusting trends
    pub fn required_data_days(&self, kind: WorkloadKind, env: Environment) -> u32 {
        self.workload(kind)
            .min_data_days
            .max(self.environment(env).min_data_days)
    }
}

impl Default for PolicyTables {
    fn default() -> Self {
        let workload = |safety_buffer, min_data_days, risk_level| WorkloadPolicy {
            safety_buffer,
            min_data_days,
            risk_level,
            optimize_enabled: true,
        };

        let workloads = HashMap::from([
            (WorkloadKind::Deployment, workload(1.3, 7, RiskLevel::Low)),
            (WorkloadKind::StatefulSet, workload(1.5, 14, RiskLevel::High)),
            (WorkloadKind::DaemonSet, workload(1.4, 7, RiskLevel::Medium)),
            (WorkloadKind::Job, workload(1.2, 3, RiskLevel::Low)),
            (WorkloadKind::CronJob, workload(1.2, 7, RiskLevel::Low)),
            (WorkloadKind::ReplicaSet, workload(1.3, 7, RiskLevel::Low)),
            (WorkloadKind::Unknown, CONSERVATIVE_WORKLOAD_POLICY),
        ]);

        let environments = HashMap::from([
            (
                Environment::Production,
                EnvironmentPolicy {
                    buffer_multiplier: 1.3,
                    min_data_days: 14,
                    risk_tolerance: RiskTolerance::Low,
                    is_production: true,
                },
            ),
            (
                Environment::Staging,
                EnvironmentPolicy {
                    buffer_multiplier: 1.1,
                    min_data_days: 7,
                    risk_tolerance: RiskTolerance::Medium,
                    is_production: false,
                },
            ),
            (
                Environment::Development,
                EnvironmentPolicy {
                    buffer_multiplier: 1.0,
                    min_data_days: 3,
                    risk_tolerance: RiskTolerance::High,
                    is_production: false,
                },
            ),
            (Environment::Unknown, CONSERVATIVE_ENVIRONMENT_POLICY),
        ]);

        Self {
            workloads,
            environments,
        }
    }
}
