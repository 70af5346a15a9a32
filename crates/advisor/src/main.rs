//! Right-sizing advisor daemon
//!
//! Periodically scans the usage snapshot written by a collector,
//! computes right-sizing recommendations and serves them with health
//! and Prometheus metrics over HTTP.

use advisor_lib::{
    health::{components, HealthRegistry},
    observability::{AdvisorMetrics, StructuredLogger},
    PolicyTables, SampleSource, Scanner, SnapshotFileSource, StaticPricing,
};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;
mod scan_loop;

const ADVISOR_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    let config = config::AdvisorConfig::load()?;
    info!(
        cluster = %config.cluster_name,
        region = %config.region,
        provider = %config.provider,
        "Advisor configured"
    );

    let health_registry = HealthRegistry::new();
    health_registry.register(components::SAMPLE_SOURCE).await;
    health_registry.register(components::SCANNER).await;
    health_registry.register(components::PRICING).await;

    let metrics = AdvisorMetrics::new();
    let logger = StructuredLogger::new(&config.cluster_name);

    let source: Arc<dyn SampleSource> = Arc::new(SnapshotFileSource::new(&config.snapshot_path));
    let pricing = Arc::new(StaticPricing::new(config.provider));
    let scanner = Arc::new(Scanner::new(
        Arc::new(PolicyTables::default()),
        config.recommender.clone(),
        config.region.clone(),
    ));

    logger.log_startup(ADVISOR_VERSION, &config.region, &source.describe());

    let app_state = Arc::new(api::AppState::new(health_registry, metrics));
    let (shutdown_tx, _) = broadcast::channel(1);

    let scan_loop = scan_loop::ScanLoop::new(
        source,
        pricing,
        scanner,
        app_state.clone(),
        logger.clone(),
        Duration::from_secs(config.scan_interval_secs),
    );
    let scan_handle = tokio::spawn(scan_loop.run(shutdown_tx.subscribe()));

    let api_port = config.api_port;
    let api_handle = tokio::spawn(async move {
        if let Err(e) = api::serve(api_port, app_state).await {
            error!(error = %e, "API server stopped");
        }
    });

    tokio::signal::ctrl_c().await?;
    logger.log_shutdown("SIGINT received");

    let _ = shutdown_tx.send(());
    let _ = scan_handle.await;
    api_handle.abort();

    Ok(())
}
