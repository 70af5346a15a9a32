//! Workload and environment sizing policies
//!
//! Static, read-only lookup tables. A `PolicyTables` value is built once
//! at startup and shared by reference (`Arc`) with everything that sizes
//! workloads, so the decision policy stays a function of its inputs.

mod tables;

pub use tables::{
    EnvironmentPolicy, PolicyTables, WorkloadPolicy, CONSERVATIVE_ENVIRONMENT_POLICY,
    CONSERVATIVE_WORKLOAD_POLICY, MIN_SAFETY_BUFFER,
};
