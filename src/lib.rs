pub mod aggregate;
pub mod chart;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod io_utils;
pub mod join;
pub mod loader;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod rank;
pub mod table;
pub mod time_filter;

use std::{
    env,
    fs::File,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info};
use serde::Serialize;

use crate::{
    cli::{Cli, Commands, SourceArgs},
    config::{ColumnMapping, PipelineConfig},
    loader::SourcePaths,
    model::UsageCount,
    pipeline::{PipelineOutput, PipelineWarning, StageCounts},
    rank::RankMode,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("article_usage", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Prepare(args) => handle_prepare(&args),
        Commands::Rank(args) => handle_rank(&args),
        Commands::Run(args) => handle_run(&args),
    }
}

fn handle_prepare(args: &cli::PrepareArgs) -> Result<()> {
    // Top-N plays no part in preparing.
    let config = PipelineConfig::new(args.year, *config::TOP_N_RANGE.start())?;
    prepare(&args.source, &config, &args.archive_dir)?;
    Ok(())
}

fn handle_rank(args: &cli::RankArgs) -> Result<()> {
    let config = PipelineConfig::new(args.year, args.top)?;
    export::require_existing(&args.archive_dir)?;
    let usage_path = export::usage_file(&args.archive_dir, config.year);
    let usage = export::read_usage(&usage_path)
        .with_context(|| format!("Loading prepared usage for {}", config.year))?;
    info!("Loaded {} usage row(s) from {:?}", usage.len(), usage_path);
    for mode in args.scope.modes() {
        let ranked = rank_and_export(&usage, mode, &config, &args.archive_dir)?;
        if args.preview {
            print!("{}", table::render_ranked(&ranked, args.preview_rows));
        }
    }
    Ok(())
}

fn handle_run(args: &cli::RunArgs) -> Result<()> {
    let config = PipelineConfig::new(args.year, args.top)?;
    let output = prepare(&args.source, &config, &args.archive_dir)?;
    let mut outputs = vec![
        export::joined_file(&args.archive_dir, config.year),
        export::usage_file(&args.archive_dir, config.year),
    ];
    for mode in args.scope.modes() {
        rank_and_export(&output.usage, mode, &config, &args.archive_dir)?;
        outputs.push(export::ranking_dir(
            &args.archive_dir,
            mode,
            config.top_n,
            config.year,
        ));
    }
    if let Some(path) = &args.summary {
        let summary = RunSummary {
            config,
            counts: output.counts,
            warnings: output.warnings,
            outputs,
        };
        summary.save(path)?;
        info!("Run summary written to {:?}", path);
    }
    Ok(())
}

fn prepare(source: &SourceArgs, config: &PipelineConfig, archive_dir: &Path) -> Result<PipelineOutput> {
    let mapping = ColumnMapping::load_or_default(source.columns.as_deref())?;
    let encoding = io_utils::resolve_encoding(source.input_encoding.as_deref())?;
    let paths = SourcePaths {
        orders: source.orders.clone(),
        links: source.links.clone(),
        catalog: source.catalog.clone(),
    };
    debug!("Source tables: {paths:?}");
    let raw = loader::load_tables(&paths, &mapping, source.delimiter, encoding)
        .context("Loading source tables")?;

    let output = pipeline::run(&raw, config);

    export::ensure_archive_dir(archive_dir)?;
    export::write_joined(&export::joined_file(archive_dir, config.year), &output.joined)?;
    export::write_usage(&export::usage_file(archive_dir, config.year), &output.usage)?;
    Ok(output)
}

fn rank_and_export(
    usage: &[UsageCount],
    mode: RankMode,
    config: &PipelineConfig,
    archive_dir: &Path,
) -> Result<Vec<model::RankedUsage>> {
    let ranked = rank::rank_top_n(usage, mode, config.top_n);
    let dir = export::ranking_dir(archive_dir, mode, config.top_n, config.year);
    match mode {
        RankMode::Month => {
            export::write_month_ranking(&dir, &ranked, config.top_n, config.year)?;
        }
        RankMode::Group => {
            export::write_group_partitions(&dir, &ranked)?;
        }
    }
    Ok(ranked)
}

#[derive(Debug, Serialize)]
struct RunSummary {
    config: PipelineConfig,
    counts: StageCounts,
    warnings: Vec<PipelineWarning>,
    outputs: Vec<PathBuf>,
}

impl RunSummary {
    fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).with_context(|| format!("Creating summary file {path:?}"))?;
        serde_json::to_writer_pretty(file, self).context("Writing run summary JSON")
    }
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
