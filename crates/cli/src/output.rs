//! Output formatting utilities

use advisor_lib::{Confidence, Rating, RecommendationType};
use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// Parse a format name from the config file
    pub fn from_name(name: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(name, true).ok()
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format bytes as a Kubernetes-style quantity
pub fn format_bytes(bytes: i64) -> String {
    const KI: f64 = 1024.0;
    const MI: f64 = KI * 1024.0;
    const GI: f64 = MI * 1024.0;

    let b = bytes as f64;
    if b >= GI {
        format!("{:.2}Gi", b / GI)
    } else if b >= MI {
        format!("{:.0}Mi", b / MI)
    } else if b >= KI {
        format!("{:.0}Ki", b / KI)
    } else {
        format!("{}B", bytes)
    }
}

/// Format millicores as cores or `m` units
pub fn format_cpu(millicores: i64) -> String {
    if millicores >= 1000 {
        format!("{:.2}", millicores as f64 / 1000.0)
    } else {
        format!("{}m", millicores)
    }
}

pub fn format_currency(amount: f64, currency: &str) -> String {
    match currency {
        "USD" => format!("${:.2}", amount),
        "EUR" => format!("€{:.2}", amount),
        "GBP" => format!("£{:.2}", amount),
        _ => format!("{:.2} {}", amount, currency),
    }
}

pub fn color_type(recommendation_type: RecommendationType) -> String {
    let text = recommendation_type.to_string();
    match recommendation_type {
        RecommendationType::RightSize => text.green().to_string(),
        RecommendationType::ScaleDown => text.yellow().to_string(),
        RecommendationType::NoAction => text.dimmed().to_string(),
    }
}

pub fn color_rating(rating: Rating) -> String {
    let text = rating.to_string();
    match rating {
        Rating::High => text.red().to_string(),
        Rating::Medium => text.yellow().to_string(),
        Rating::Low => text.green().to_string(),
        Rating::None | Rating::NotApplicable => text,
    }
}

pub fn color_confidence(confidence: Confidence) -> String {
    let text = confidence.to_string();
    match confidence {
        Confidence::High => text.green().to_string(),
        Confidence::Medium => text.yellow().to_string(),
        Confidence::Low => text.red().to_string(),
    }
}
