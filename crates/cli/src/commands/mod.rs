//! CLI subcommand implementations

pub mod analyze;
pub mod costs;
pub mod recommendations;
