//! Cost-related CLI commands

use advisor_lib::recommender::CostAnalysis;
use anyhow::Result;
use colored::Colorize;

use crate::client::ApiClient;
use crate::output::{format_currency, print_json, OutputFormat};

/// Show the cost analysis of the latest scan
pub async fn show_costs(
    client: &ApiClient,
    namespace: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let result = client.costs(namespace.as_deref()).await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => print_cost_analysis(&result),
    }

    Ok(())
}

pub fn print_cost_analysis(result: &CostAnalysis) {
    println!("{}", "Cost Analysis".bold());
    println!("{}", "=".repeat(50));

    if let Some(ns) = &result.namespace {
        println!("Namespace:              {}", ns.cyan());
    } else {
        println!("Scope:                  {}", "Cluster-wide".cyan());
    }

    println!("Workloads:              {}", result.workload_count);
    println!(
        "Last updated:           {}",
        result.last_updated.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!();

    println!("{}", "Monthly Costs".bold());
    println!("{}", "-".repeat(50));
    println!(
        "Current:                {}",
        format_currency(result.current_monthly_cost, &result.currency)
    );
    println!(
        "Recommended:            {}",
        format_currency(result.recommended_monthly_cost, &result.currency).green()
    );
    println!();

    println!(
        "{} {} ({:.1}%)",
        "Potential Savings:".bold(),
        format_currency(result.potential_savings, &result.currency)
            .green()
            .bold(),
        savings_percent(result)
    );
}

fn savings_percent(result: &CostAnalysis) -> f64 {
    if result.current_monthly_cost > 0.0 {
        result.potential_savings / result.current_monthly_cost * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_savings_percent() {
        let mut analysis = CostAnalysis {
            namespace: None,
            workload_count: 2,
            current_monthly_cost: 80.0,
            recommended_monthly_cost: 60.0,
            potential_savings: 20.0,
            currency: "USD".to_string(),
            last_updated: Utc::now(),
        };
        assert_eq!(savings_percent(&analysis), 25.0);

        analysis.current_monthly_cost = 0.0;
        assert_eq!(savings_percent(&analysis), 0.0);
    }
}
