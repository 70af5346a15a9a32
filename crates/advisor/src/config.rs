//! Advisor daemon configuration

use advisor_lib::{CloudProvider, RecommenderConfig};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming an optional config file
pub const CONFIG_FILE_ENV: &str = "ADVISOR_CONFIG_FILE";

/// Advisor configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AdvisorConfig {
    /// Cluster label attached to log events
    #[serde(default = "default_cluster_name")]
    pub cluster_name: String,

    /// API server port for health, metrics and recommendations
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Snapshot file written by the usage collector
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,

    /// Seconds between scans
    #[serde(default = "default_scan_interval")]
    pub scan_interval_secs: u64,

    /// Pricing region
    #[serde(default = "default_region")]
    pub region: String,

    #[serde(default)]
    pub provider: CloudProvider,

    #[serde(default)]
    pub recommender: RecommenderConfig,
}

fn default_cluster_name() -> String {
    std::env::var("CLUSTER_NAME").unwrap_or_else(|_| "default".to_string())
}

fn default_api_port() -> u16 {
    8080
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("/var/lib/rightsize-advisor/snapshot.json")
}

fn default_scan_interval() -> u64 {
    300
}

fn default_region() -> String {
    "us-east-1".to_string()
}

impl AdvisorConfig {
    /// Load configuration from `ADVISOR_*` environment variables layered
    /// over the file named by `ADVISOR_CONFIG_FILE`, if any
    pub fn load() -> Result<Self> {
        let file = std::env::var_os(CONFIG_FILE_ENV).map(PathBuf::from);
        Self::load_from(file.as_deref())
    }

    pub fn load_from(file: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("ADVISOR")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read advisor configuration")?;

        let config: AdvisorConfig = config
            .try_deserialize()
            .context("Invalid advisor configuration")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.scan_interval_secs == 0 {
            anyhow::bail!("scan_interval_secs must be positive");
        }
        if self.recommender.buffer_floor > self.recommender.buffer_ceiling {
            anyhow::bail!(
                "recommender.buffer_floor ({}) exceeds buffer_ceiling ({})",
                self.recommender.buffer_floor,
                self.recommender.buffer_ceiling
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn config_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_file_values_with_defaults() {
        let file = config_file(
            r#"{
                "api_port": 9191,
                "region": "europe-west1",
                "provider": "gcp",
                "recommender": { "reduction_threshold_percent": 30.0 }
            }"#,
        );
        let config = AdvisorConfig::load_from(Some(file.path())).unwrap();

        assert_eq!(config.api_port, 9191);
        assert_eq!(config.region, "europe-west1");
        assert_eq!(config.provider, CloudProvider::Gcp);
        assert_eq!(config.scan_interval_secs, 300);
        assert_eq!(config.recommender.reduction_threshold_percent, 30.0);
        assert_eq!(config.recommender.buffer_ceiling, 3.0);
    }

    #[test]
    fn test_rejects_inverted_buffer_clamp() {
        let file = config_file(r#"{ "recommender": { "buffer_floor": 4.0 } }"#);
        assert!(AdvisorConfig::load_from(Some(file.path())).is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = AdvisorConfig::load_from(Some(Path::new("/nonexistent/advisor.json")));
        assert!(result.is_err());
    }
}
