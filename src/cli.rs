use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::{config, rank::RankMode};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Rank monthly article usage per article group from order exports",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Join orders, order articles and the article group catalog into monthly usage counts
    Prepare(PrepareArgs),
    /// Rank a prepared usage table per month or per article group
    Rank(RankArgs),
    /// Prepare the usage table and rank it in one pass
    Run(RunArgs),
}

#[derive(Debug, Clone, Args)]
pub struct SourceArgs {
    /// Orders table with order id and production end columns
    #[arg(long = "orders")]
    pub orders: PathBuf,
    /// Order/article table linking order ids to article codes
    #[arg(long = "links")]
    pub links: PathBuf,
    /// Article catalog mapping article codes to article groups
    #[arg(long = "catalog")]
    pub catalog: PathBuf,
    /// YAML file naming the source columns (defaults to order_id, production_end, article_code, article_group)
    #[arg(long = "columns")]
    pub columns: Option<PathBuf>,
    /// CSV delimiter character for the source tables (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the source tables (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct PrepareArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Year to evaluate (2000-2100)
    #[arg(short = 'y', long, value_parser = parse_year)]
    pub year: i32,
    /// Directory receiving the merged rows and the usage table
    #[arg(short = 'a', long = "archive-dir")]
    pub archive_dir: PathBuf,
}

#[derive(Debug, Args)]
pub struct RankArgs {
    /// Year of the prepared usage table (2000-2100)
    #[arg(short = 'y', long, value_parser = parse_year)]
    pub year: i32,
    /// Number of articles kept per partition (1-5000)
    #[arg(short = 'n', long = "top", value_parser = parse_top_n)]
    pub top: usize,
    /// Partitioning of the ranking
    #[arg(long = "scope", value_enum, default_value = "month")]
    pub scope: RankingScope,
    /// Directory holding the usage table written by `prepare`
    #[arg(short = 'a', long = "archive-dir")]
    pub archive_dir: PathBuf,
    /// Print the first ranked rows to stdout
    #[arg(long)]
    pub preview: bool,
    /// Number of rows shown by --preview
    #[arg(long = "preview-rows", default_value_t = 20)]
    pub preview_rows: usize,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Year to evaluate (2000-2100)
    #[arg(short = 'y', long, value_parser = parse_year)]
    pub year: i32,
    /// Number of articles kept per partition (1-5000)
    #[arg(short = 'n', long = "top", value_parser = parse_top_n)]
    pub top: usize,
    /// Partitioning of the ranking
    #[arg(long = "scope", value_enum, default_value = "both")]
    pub scope: RankingScope,
    /// Directory receiving every report of the run
    #[arg(short = 'a', long = "archive-dir")]
    pub archive_dir: PathBuf,
    /// Write stage counts and warnings of the run as JSON
    #[arg(long)]
    pub summary: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum RankingScope {
    /// Top-N per month across all groups
    Month,
    /// Top-N per article group and month
    Group,
    /// Both rankings
    Both,
}

impl RankingScope {
    pub fn modes(self) -> Vec<RankMode> {
        match self {
            RankingScope::Month => vec![RankMode::Month],
            RankingScope::Group => vec![RankMode::Group],
            RankingScope::Both => vec![RankMode::Month, RankMode::Group],
        }
    }
}

pub fn parse_year(value: &str) -> Result<i32, String> {
    let year: i32 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{value}' is not a whole number"))?;
    config::validate_year(year).map_err(|err| err.to_string())
}

pub fn parse_top_n(value: &str) -> Result<usize, String> {
    let top: usize = value
        .trim()
        .parse()
        .map_err(|_| format!("'{value}' is not a positive whole number"))?;
    if config::TOP_N_RANGE.contains(&top) {
        Ok(top)
    } else {
        Err(crate::error::UsageError::TopNOutOfRange(top).to_string())
    }
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
