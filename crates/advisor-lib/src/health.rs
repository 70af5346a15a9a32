//! Component health for the advisor daemon
//!
//! Backs the liveness and readiness probes. The advisor is ready once a
//! scan has published a report and no component is failing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Component names for health tracking
pub mod components {
    pub const SAMPLE_SOURCE: &str = "sample_source";
    pub const SCANNER: &str = "scanner";
    pub const PRICING: &str = "pricing";
}

/// Health status of a component, ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    /// Still answering, e.g. on fallback pricing
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub since: DateTime<Utc>,
}

impl ComponentHealth {
    fn new(status: ComponentStatus, message: Option<String>) -> Self {
        Self {
            status,
            message,
            since: Utc::now(),
        }
    }
}

/// Body of the liveness probe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_scan_at: Option<DateTime<Utc>>,
    pub components: BTreeMap<String, ComponentHealth>,
}

/// Body of the readiness probe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Default)]
struct RegistryState {
    components: BTreeMap<String, ComponentHealth>,
    last_scan_at: Option<DateTime<Utc>>,
}

impl RegistryState {
    fn worst_status(&self) -> ComponentStatus {
        self.components
            .values()
            .map(|c| c.status)
            .max()
            .unwrap_or(ComponentStatus::Healthy)
    }

    fn failing(&self) -> Vec<&str> {
        self.components
            .iter()
            .filter(|(_, c)| c.status == ComponentStatus::Unhealthy)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// Shared registry of component health and scan progress
#[derive(Debug, Clone, Default)]
pub struct HealthRegistry {
    state: Arc<RwLock<RegistryState>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component as healthy
    pub async fn register(&self, name: &str) {
        self.set(name, ComponentStatus::Healthy, None).await;
    }

    pub async fn set_healthy(&self, name: &str) {
        self.set(name, ComponentStatus::Healthy, None).await;
    }

    pub async fn set_degraded(&self, name: &str, message: impl Into<String>) {
        self.set(name, ComponentStatus::Degraded, Some(message.into()))
            .await;
    }

    pub async fn set_unhealthy(&self, name: &str, message: impl Into<String>) {
        self.set(name, ComponentStatus::Unhealthy, Some(message.into()))
            .await;
    }

    async fn set(&self, name: &str, status: ComponentStatus, message: Option<String>) {
        let mut state = self.state.write().await;
        // keep `since` when nothing changed
        if let Some(current) = state.components.get(name) {
            if current.status == status && current.message == message {
                return;
            }
        }
        state
            .components
            .insert(name.to_string(), ComponentHealth::new(status, message));
    }

    /// Note that a scan published a report
    pub async fn record_scan(&self, at: DateTime<Utc>) {
        self.state.write().await.last_scan_at = Some(at);
    }

    pub async fn health(&self) -> HealthResponse {
        let state = self.state.read().await;
        HealthResponse {
            status: state.worst_status(),
            last_scan_at: state.last_scan_at,
            components: state.components.clone(),
        }
    }

    pub async fn readiness(&self) -> ReadinessResponse {
        let state = self.state.read().await;

        let reason = if state.last_scan_at.is_none() {
            Some("No scan has completed yet".to_string())
        } else if state.worst_status() == ComponentStatus::Unhealthy {
            Some(format!("Unhealthy components: {}", state.failing().join(", ")))
        } else {
            None
        };

        ReadinessResponse {
            ready: reason.is_none(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_registry_is_healthy() {
        let health = HealthRegistry::new().health().await;

        assert_eq!(health.status, ComponentStatus::Healthy);
        assert!(health.components.is_empty());
        assert!(health.last_scan_at.is_none());
    }

    #[tokio::test]
    async fn test_fallback_pricing_degrades() {
        let registry = HealthRegistry::new();
        registry.register(components::SAMPLE_SOURCE).await;
        registry.register(components::PRICING).await;

        registry
            .set_degraded(components::PRICING, "using default rates")
            .await;

        let health = registry.health().await;
        assert_eq!(health.status, ComponentStatus::Degraded);
        assert_eq!(
            health.components[components::PRICING].message.as_deref(),
            Some("using default rates")
        );
    }

    #[tokio::test]
    async fn test_unhealthy_wins_over_degraded() {
        let registry = HealthRegistry::new();
        registry.set_degraded(components::PRICING, "fallback").await;
        registry
            .set_unhealthy(components::SAMPLE_SOURCE, "snapshot missing")
            .await;

        assert_eq!(registry.health().await.status, ComponentStatus::Unhealthy);
    }

    #[tokio::test]
    async fn test_repeated_status_keeps_since() {
        let registry = HealthRegistry::new();
        registry.set_degraded(components::PRICING, "fallback").await;
        let first = registry.health().await.components[components::PRICING].since;

        registry.set_degraded(components::PRICING, "fallback").await;
        let second = registry.health().await.components[components::PRICING].since;

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_not_ready_before_first_scan() {
        let readiness = HealthRegistry::new().readiness().await;

        assert!(!readiness.ready);
        assert_eq!(readiness.reason.as_deref(), Some("No scan has completed yet"));
    }

    #[tokio::test]
    async fn test_ready_after_scan() {
        let registry = HealthRegistry::new();
        registry.register(components::SCANNER).await;
        registry.set_degraded(components::PRICING, "fallback").await;
        registry.record_scan(Utc::now()).await;

        let readiness = registry.readiness().await;
        assert!(readiness.ready);
        assert!(readiness.reason.is_none());
        assert!(registry.health().await.last_scan_at.is_some());
    }

    #[tokio::test]
    async fn test_not_ready_when_source_fails() {
        let registry = HealthRegistry::new();
        registry.record_scan(Utc::now()).await;
        registry
            .set_unhealthy(components::SAMPLE_SOURCE, "read failed")
            .await;

        let readiness = registry.readiness().await;
        assert!(!readiness.ready);
        assert_eq!(
            readiness.reason.as_deref(),
            Some("Unhealthy components: sample_source")
        );
    }
}
