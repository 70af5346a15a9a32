//! Right-sizing advisor CLI
//!
//! Analyzes usage snapshots locally and queries the advisor daemon for
//! recommendations and cost analysis.

mod client;
mod commands;
mod config;
mod output;

use advisor_lib::{CloudProvider, RecommendationType};
use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{analyze, costs, recommendations};
use std::path::PathBuf;

const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Container right-sizing advisor CLI
#[derive(Parser)]
#[command(name = "rsz")]
#[command(author, version, about = "CLI for the container right-sizing advisor", long_about = None)]
pub struct Cli {
    /// Advisor API URL (can also be set via RSZ_API_URL env var)
    #[arg(long, env = "RSZ_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short, global = true)]
    pub format: Option<output::OutputFormat>,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a usage snapshot file locally
    Analyze {
        /// Snapshot JSON file
        file: PathBuf,

        /// Pricing region
        #[arg(long, default_value = "us-east-1")]
        region: String,

        /// Cloud provider for list prices (aws, gcp, azure, onprem)
        #[arg(long, default_value = "aws")]
        provider: CloudProvider,

        /// Only show this namespace
        #[arg(long, short)]
        namespace: Option<String>,

        /// Only show this recommendation type (right-size, scale-down, no-action)
        #[arg(long = "type")]
        recommendation_type: Option<RecommendationType>,
    },

    /// Get data from the advisor
    #[command(subcommand)]
    Get(GetCommands),

    /// Explain the recommendation for a workload
    Explain {
        /// Workload as <namespace>/<name>
        workload: String,
    },

    /// View cost analysis and savings
    #[command(subcommand)]
    Costs(CostsCommands),
}

#[derive(Subcommand)]
pub enum GetCommands {
    /// Get recommendations from the latest scan
    Recommendations {
        /// Filter by namespace
        #[arg(long, short)]
        namespace: Option<String>,

        /// Filter by type (right-size, scale-down, no-action)
        #[arg(long = "type")]
        recommendation_type: Option<RecommendationType>,
    },
}

#[derive(Subcommand)]
pub enum CostsCommands {
    /// Show cost analysis
    Show {
        /// Filter by namespace (shows cluster-wide if not specified)
        #[arg(long, short)]
        namespace: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .compact()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(std::io::stderr)
            .init();
    }

    let settings = config::Config::load()?;
    let format = cli
        .format
        .or_else(|| {
            settings
                .default_format
                .as_deref()
                .and_then(output::OutputFormat::from_name)
        })
        .unwrap_or_default();
    let api_url = cli
        .api_url
        .or_else(|| settings.api_url.clone())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let default_namespace = |namespace: Option<String>| {
        namespace.or_else(|| settings.default_namespace.clone())
    };

    match cli.command {
        Commands::Analyze {
            file,
            region,
            provider,
            namespace,
            recommendation_type,
        } => {
            let options = analyze::AnalyzeOptions {
                region,
                provider,
                namespace,
                recommendation_type,
            };
            analyze::analyze(&file, options, format).await?;
        }
        Commands::Get(GetCommands::Recommendations {
            namespace,
            recommendation_type,
        }) => {
            let client = client::ApiClient::new(&api_url)?;
            recommendations::get_recommendations(
                &client,
                default_namespace(namespace),
                recommendation_type,
                format,
            )
            .await?;
        }
        Commands::Explain { workload } => {
            let client = client::ApiClient::new(&api_url)?;
            recommendations::explain(&client, &workload, format).await?;
        }
        Commands::Costs(CostsCommands::Show { namespace }) => {
            let client = client::ApiClient::new(&api_url)?;
            costs::show_costs(&client, default_namespace(namespace), format).await?;
        }
    }

    Ok(())
}
