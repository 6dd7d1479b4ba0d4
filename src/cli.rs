use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "onco-dash", version, about = "Cancer statistics dashboard")]
pub struct CliArgs {
    /// Load a CSV or JSON dataset instead of the embedded one
    #[arg(long, value_name = "PATH")]
    pub data: Option<PathBuf>,

    /// Print KPIs and chart summaries and exit
    #[arg(long)]
    pub headless: bool,

    /// Print the headless report as JSON
    #[arg(long, requires = "headless")]
    pub json: bool,

    /// Metric column, e.g. "ASR (World)" or an alias (asr, crude, risk)
    #[arg(long, value_name = "NAME")]
    pub metric: Option<String>,

    /// First year of the window
    #[arg(long = "from", value_name = "YEAR")]
    pub year_min: Option<i32>,

    /// Last year of the window
    #[arg(long = "to", value_name = "YEAR")]
    pub year_max: Option<i32>,

    /// Comma-separated cancer types to select (default: all)
    #[arg(long, value_name = "A,B,..", value_delimiter = ',')]
    pub types: Vec<String>,

    /// Append regression projections to trend lines
    #[arg(long)]
    pub projection: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}
