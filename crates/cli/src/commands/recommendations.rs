//! Recommendation-related CLI commands

use advisor_lib::{RecommendationType, WorkloadRecommendation};
use anyhow::{Context, Result};
use colored::Colorize;
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{
    color_confidence, color_rating, color_type, format_bytes, format_cpu, format_currency,
    print_json, print_warning, OutputFormat,
};

/// Row for recommendations table
#[derive(Tabled)]
struct RecommendationRow {
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Workload")]
    workload: String,
    #[tabled(rename = "Type")]
    recommendation_type: String,
    #[tabled(rename = "CPU")]
    cpu: String,
    #[tabled(rename = "Memory")]
    memory: String,
    #[tabled(rename = "Savings/mo")]
    savings: String,
    #[tabled(rename = "Risk")]
    risk: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
}

impl RecommendationRow {
    fn new(rec: &WorkloadRecommendation, currency: &str) -> Self {
        let r = &rec.recommendation;
        Self {
            namespace: rec.namespace.clone(),
            workload: format!("{}/{}", rec.workload_kind.kubectl_resource(), rec.name),
            recommendation_type: color_type(r.recommendation_type),
            cpu: change(
                format_cpu(r.current_cpu_millicores),
                format_cpu(r.recommended_cpu_millicores),
                r.recommendation_type,
            ),
            memory: change(
                format_bytes(r.current_memory_bytes),
                format_bytes(r.recommended_memory_bytes),
                r.recommendation_type,
            ),
            savings: format_currency(r.savings_monthly, currency),
            risk: color_rating(r.risk),
            confidence: color_confidence(r.confidence),
        }
    }
}

fn change(current: String, recommended: String, recommendation_type: RecommendationType) -> String {
    match recommendation_type {
        RecommendationType::NoAction => current,
        _ => format!("{} → {}", current, recommended),
    }
}

/// Render recommendations as a table followed by a total line
pub fn print_recommendations(recs: &[WorkloadRecommendation], currency: &str) {
    if recs.is_empty() {
        print_warning("No recommendations found");
        return;
    }

    let rows: Vec<RecommendationRow> = recs
        .iter()
        .map(|r| RecommendationRow::new(r, currency))
        .collect();

    let table = tabled::Table::new(rows)
        .with(tabled::settings::Style::rounded())
        .to_string();
    println!("{}", table);

    let savings: f64 = recs.iter().map(|r| r.recommendation.savings_monthly).sum();
    println!(
        "\nTotal: {} recommendations, {} potential monthly savings",
        recs.len(),
        format_currency(savings, currency).green()
    );
}

/// Render one recommendation in detail
pub fn print_explanation(rec: &WorkloadRecommendation, currency: &str) {
    let r = &rec.recommendation;

    println!(
        "{} {}/{} ({})",
        "Workload:".bold(),
        rec.namespace,
        rec.name,
        rec.workload_kind
    );
    println!("{}", "=".repeat(50));
    println!("Environment:            {}", rec.environment);
    println!("Recommendation:         {}", color_type(r.recommendation_type));
    println!("Reason:                 {}", r.reason);
    println!();

    println!("{}", "Resources".bold());
    println!("{}", "-".repeat(50));
    println!(
        "CPU request:            {} → {}",
        format_cpu(r.current_cpu_millicores),
        format_cpu(r.recommended_cpu_millicores)
    );
    println!(
        "Memory request:         {} → {}",
        format_bytes(r.current_memory_bytes),
        format_bytes(r.recommended_memory_bytes)
    );
    println!();

    println!("{}", "Assessment".bold());
    println!("{}", "-".repeat(50));
    println!(
        "Monthly cost:           {} → {}",
        format_currency(rec.current_monthly_cost, currency),
        format_currency(rec.recommended_monthly_cost, currency)
    );
    println!(
        "Savings:                {}",
        format_currency(r.savings_monthly, currency).green()
    );
    println!("Impact:                 {}", color_rating(r.impact));
    println!("Risk:                   {}", color_rating(r.risk));
    println!("Confidence:             {}", color_confidence(r.confidence));
    if !r.pattern_info.is_empty() {
        println!("Usage:                  {}", r.pattern_info);
    }

    if let Some(command) = rec.advisory_command() {
        println!();
        println!("{}", "Suggested command".bold());
        println!("{}", "-".repeat(50));
        println!("{}", command.cyan());
    }
}

/// Get recommendations from the advisor with optional filters
pub async fn get_recommendations(
    client: &ApiClient,
    namespace: Option<String>,
    recommendation_type: Option<RecommendationType>,
    format: OutputFormat,
) -> Result<()> {
    let result = client
        .list_recommendations(namespace.as_deref(), recommendation_type)
        .await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => print_recommendations(&result.recommendations, &result.currency),
    }

    Ok(())
}

/// Explain the recommendation for `namespace/name`
pub async fn explain(client: &ApiClient, workload: &str, format: OutputFormat) -> Result<()> {
    let (namespace, name) = parse_workload(workload)?;
    let rec = client.get_recommendation(namespace, name).await?;

    match format {
        OutputFormat::Json => print_json(&rec)?,
        OutputFormat::Table => {
            // Single recommendations carry no currency; ask the cost endpoint
            let currency = client
                .costs(Some(namespace))
                .await
                .map(|c| c.currency)
                .unwrap_or_else(|_| "USD".to_string());
            print_explanation(&rec, &currency);
        }
    }

    Ok(())
}

/// Split `namespace/name`
pub fn parse_workload(workload: &str) -> Result<(&str, &str)> {
    workload
        .split_once('/')
        .filter(|(ns, name)| !ns.is_empty() && !name.is_empty() && !name.contains('/'))
        .with_context(|| format!("expected <namespace>/<name>, got '{}'", workload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_workload() {
        assert_eq!(parse_workload("shop/web").unwrap(), ("shop", "web"));
        assert!(parse_workload("web").is_err());
        assert!(parse_workload("/web").is_err());
        assert!(parse_workload("shop/").is_err());
        assert!(parse_workload("a/b/c").is_err());
    }

    #[test]
    fn test_change_hides_arrow_for_no_action() {
        assert_eq!(
            change("1.00".into(), "1.00".into(), RecommendationType::NoAction),
            "1.00"
        );
        assert_eq!(
            change("1.00".into(), "281m".into(), RecommendationType::RightSize),
            "1.00 → 281m"
        );
    }
}
