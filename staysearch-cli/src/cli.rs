use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "staysearch",
    version,
    about = "Search vacation rentals through a stdio MCP tool provider"
)]
pub struct Cli {
    /// Configuration file (defaults to config/staysearch.toml when present)
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub check_in: Option<NaiveDate>,
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub check_out: Option<NaiveDate>,
    #[arg(long)]
    pub min_price: Option<u32>,
    #[arg(long)]
    pub max_price: Option<u32>,
    #[arg(long)]
    pub adults: Option<u32>,
    /// Pagination cursor from a previous search
    #[arg(long)]
    pub cursor: Option<String>,
    /// Number of listings to render
    #[arg(long)]
    pub limit: Option<usize>,
    /// Tool to invoke on the provider
    #[arg(long)]
    pub tool: Option<String>,
    #[arg(long, short, value_enum, default_value_t = OutputMode::Both)]
    pub output: OutputMode,
    /// Only list the provider's tools
    #[arg(long)]
    pub list_tools: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputMode {
    /// Deterministic plain-text report
    Direct,
    /// Report written by the text-generation service
    Summary,
    /// Summary first, then the direct report for comparison
    Both,
}

impl OutputMode {
    pub fn wants_summary(self) -> bool {
        matches!(self, Self::Summary | Self::Both)
    }

    pub fn wants_direct(self) -> bool {
        matches!(self, Self::Direct | Self::Both)
    }
}
