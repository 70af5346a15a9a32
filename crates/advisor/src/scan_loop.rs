//! Periodic scan loop
//!
//! Loads a snapshot from the sample source, sizes every workload and
//! publishes the report for the API. A failed load keeps serving the
//! previous report.

use crate::api::AppState;
use advisor_lib::{
    health::components, CostInfoProvider, SampleSource, ScanReport, Scanner, StructuredLogger,
};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{info, warn};

pub struct ScanLoop {
    source: Arc<dyn SampleSource>,
    pricing: Arc<dyn CostInfoProvider>,
    scanner: Arc<Scanner>,
    state: Arc<AppState>,
    logger: StructuredLogger,
    interval: Duration,
}

impl ScanLoop {
    pub fn new(
        source: Arc<dyn SampleSource>,
        pricing: Arc<dyn CostInfoProvider>,
        scanner: Arc<Scanner>,
        state: Arc<AppState>,
        logger: StructuredLogger,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            pricing,
            scanner,
            state,
            logger,
            interval,
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        info!(
            interval_secs = self.interval.as_secs(),
            source = %self.source.describe(),
            "Starting scan loop"
        );

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.scan_once().await {
                        warn!(error = %e, "Scan failed, serving previous report");
                    }
                }
                _ = shutdown.recv() => {
                    info!("Shutting down scan loop");
                    break;
                }
            }
        }
    }

    /// Run one scan and publish its report
    pub async fn scan_once(&self) -> Result<()> {
        let health = &self.state.health_registry;

        let snapshot = match self.source.snapshot().await {
            Ok(snapshot) => {
                health.set_healthy(components::SAMPLE_SOURCE).await;
                snapshot
            }
            Err(e) => {
                self.state.metrics.inc_scan_errors();
                health
                    .set_unhealthy(components::SAMPLE_SOURCE, e.to_string())
                    .await;
                return Err(e).context(format!("Failed to load {}", self.source.describe()));
            }
        };

        let start = Instant::now();
        let scanner = self.scanner.clone();
        let pricing = self.pricing.clone();
        let report: ScanReport =
            match tokio::task::spawn_blocking(move || scanner.scan(&snapshot, pricing.as_ref()))
                .await
            {
                Ok(report) => report,
                Err(e) => {
                    health
                        .set_unhealthy(components::SCANNER, e.to_string())
                        .await;
                    return Err(e).context("Scan task failed");
                }
            };
        let elapsed = start.elapsed().as_secs_f64();

        health.set_healthy(components::SCANNER).await;
        if report.pricing_fallback {
            health
                .set_degraded(
                    components::PRICING,
                    format!("no prices for region '{}', using default rates", report.region),
                )
                .await;
        } else {
            health.set_healthy(components::PRICING).await;
        }

        let generated_at = report.generated_at;
        self.state.metrics.record_scan(&report, elapsed);
        self.logger.log_report(&report, elapsed);
        self.state.publish(report).await;
        health.record_scan(generated_at).await;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisor_lib::health::ComponentStatus;
    use advisor_lib::source::PodUsage;
    use advisor_lib::{
        AdvisorError, AdvisorMetrics, CloudProvider, CostInfo, HealthRegistry, PolicyTables,
        RecommenderConfig, Sample, Snapshot, StaticPricing, WorkloadKind, WorkloadSnapshot,
    };
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};
    use std::sync::atomic::{AtomicBool, Ordering};

    struct MockSource {
        fail: AtomicBool,
    }

    #[async_trait]
    impl SampleSource for MockSource {
        async fn snapshot(&self) -> advisor_lib::Result<Snapshot> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(AdvisorError::Snapshot("collector offline".to_string()));
            }
            let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
            let samples = |value: f64| -> Vec<Sample> {
                (0..50)
                    .map(|i| Sample::new(start + ChronoDuration::minutes(5 * i), value))
                    .collect()
            };
            Ok(Snapshot::new(vec![WorkloadSnapshot {
                namespace: "shop".to_string(),
                name: "web".to_string(),
                kind: WorkloadKind::Deployment,
                environment: None,
                hpa_name: None,
                pods: vec![PodUsage {
                    pod_name: "web-0".to_string(),
                    cpu_request_millicores: 1000.0,
                    memory_request_bytes: 1024.0 * 1024.0 * 1024.0,
                    cpu_samples: samples(200.0),
                    memory_samples: samples(256.0 * 1024.0 * 1024.0),
                }],
            }]))
        }

        fn describe(&self) -> String {
            "mock source".to_string()
        }
    }

    fn scan_loop(fail: bool, pricing: Arc<dyn CostInfoProvider>) -> (ScanLoop, Arc<AppState>) {
        let state = Arc::new(AppState::new(HealthRegistry::new(), AdvisorMetrics::new()));
        let scanner = Arc::new(Scanner::new(
            Arc::new(PolicyTables::default()),
            RecommenderConfig::default(),
            "us-east-1",
        ));
        let scan_loop = ScanLoop::new(
            Arc::new(MockSource {
                fail: AtomicBool::new(fail),
            }),
            pricing,
            scanner,
            state.clone(),
            StructuredLogger::new("test"),
            Duration::from_secs(60),
        );
        (scan_loop, state)
    }

    #[tokio::test]
    async fn test_scan_publishes_report_and_becomes_ready() {
        let (scan_loop, state) = scan_loop(false, Arc::new(CostInfo::default()));
        scan_loop.scan_once().await.unwrap();

        let report = state.latest().await.unwrap();
        assert_eq!(report.recommendations.len(), 1);
        assert!(state.health_registry.readiness().await.ready);
    }

    #[tokio::test]
    async fn test_source_failure_keeps_previous_report() {
        let (scan_loop, state) = scan_loop(false, Arc::new(CostInfo::default()));
        scan_loop.scan_once().await.unwrap();

        let failing = ScanLoop {
            source: Arc::new(MockSource {
                fail: AtomicBool::new(true),
            }),
            ..scan_loop
        };
        assert!(failing.scan_once().await.is_err());

        assert!(state.latest().await.is_some());
        let health = state.health_registry.health().await;
        assert_eq!(health.status, ComponentStatus::Unhealthy);
    }

    #[tokio::test]
    async fn test_pricing_fallback_degrades_health() {
        let (scan_loop, state) =
            scan_loop(false, Arc::new(StaticPricing::new(CloudProvider::Unknown)));
        scan_loop.scan_once().await.unwrap();

        let report = state.latest().await.unwrap();
        assert!(report.pricing_fallback);
        let health = state.health_registry.health().await;
        assert_eq!(health.status, ComponentStatus::Degraded);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let (scan_loop, state) = scan_loop(false, Arc::new(CostInfo::default()));
        let (tx, rx) = broadcast::channel(1);

        let handle = tokio::spawn(scan_loop.run(rx));
        // first tick fires immediately
        for _ in 0..50 {
            if state.latest().await.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        tx.send(()).unwrap();
        handle.await.unwrap();

        assert!(state.latest().await.is_some());
    }
}
