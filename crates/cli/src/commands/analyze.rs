//! Local analysis of a snapshot file

use advisor_lib::{
    CloudProvider, PolicyTables, RecommendationType, RecommenderConfig, ScanReport, Scanner,
    Snapshot, StaticPricing,
};
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use super::recommendations::print_recommendations;
use crate::output::{format_currency, print_info, print_json, print_warning, OutputFormat};

/// Options for a local analysis run
pub struct AnalyzeOptions {
    pub region: String,
    pub provider: CloudProvider,
    pub namespace: Option<String>,
    pub recommendation_type: Option<RecommendationType>,
}

/// Size every workload in a snapshot file without contacting the daemon
pub async fn analyze(path: &Path, options: AnalyzeOptions, format: OutputFormat) -> Result<()> {
    let snapshot = Snapshot::load(path)
        .await
        .with_context(|| format!("Failed to load snapshot {}", path.display()))?;
    debug!(workloads = snapshot.workloads.len(), "Loaded snapshot");

    let report = scan(&snapshot, &options);

    match format {
        OutputFormat::Json => {
            let mut report = report;
            report.recommendations = report
                .filtered(options.namespace.as_deref(), options.recommendation_type)
                .into_iter()
                .cloned()
                .collect();
            print_json(&report)?;
        }
        OutputFormat::Table => print_report(&report, &options),
    }

    Ok(())
}

pub fn scan(snapshot: &Snapshot, options: &AnalyzeOptions) -> ScanReport {
    let scanner = Scanner::new(
        Arc::new(PolicyTables::default()),
        RecommenderConfig::default(),
        options.region.clone(),
    );
    scanner.scan(snapshot, &StaticPricing::new(options.provider))
}

fn print_report(report: &ScanReport, options: &AnalyzeOptions) {
    if report.pricing_fallback {
        print_warning(&format!(
            "No prices for provider '{}' in region '{}', using default rates",
            options.provider, report.region
        ));
    }

    let recs: Vec<_> = report
        .filtered(options.namespace.as_deref(), options.recommendation_type)
        .into_iter()
        .cloned()
        .collect();
    print_recommendations(&recs, &report.currency);

    let summary = &report.summary;
    println!();
    println!("{}", "Summary".bold());
    println!("{}", "-".repeat(50));
    println!("Workloads analyzed:     {}", summary.workloads_analyzed);
    println!(
        "Right-size / scale down / no action: {} / {} / {}",
        summary.right_size, summary.scale_down, summary.no_action
    );
    println!(
        "Monthly cost:           {} → {}",
        format_currency(summary.current_monthly_cost, &report.currency),
        format_currency(summary.recommended_monthly_cost, &report.currency)
    );

    if !report.skipped.is_empty() {
        println!();
        for skipped in &report.skipped {
            print_info(&format!(
                "Skipped {}/{}: {}",
                skipped.namespace, skipped.name, skipped.reason
            ));
        }
    }
}
