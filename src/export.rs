//! Report files written to and read from the archive directory.
//!
//! Layout for a year `Y` and Top-N `N`:
//!
//! - `merged_Y.csv`: join output, one row per order/article (and catalog match)
//! - `usage_counts_Y.csv`: the usage table
//! - `top_N_per_month_Y/`: global ranking plus the line chart matrix
//! - `top_N_per_group_Y/`: one ranking per article group, plus one heatmap
//!   matrix per group under `heatmaps/`
//!
//! Per-group files are named after the group, made safe for spreadsheet sheet
//! names and file systems and cut to [`MAX_PARTITION_NAME_LEN`] characters.
//! Rankings and heatmaps live in separate directories, so a group name can
//! never address another group's heatmap.

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use anyhow::{Context, Result, anyhow};
use encoding_rs::UTF_8;
use log::{debug, info};
use regex::Regex;

use crate::{
    chart::{self, Pivot},
    error::UsageError,
    io_utils, loader,
    model::{JoinedRow, RankedUsage, UsageCount},
    rank::{self, RankMode},
};

pub const MAX_PARTITION_NAME_LEN: usize = 31;
pub const UNASSIGNED_GROUP: &str = "unassigned";
pub const HEATMAP_DIR: &str = "heatmaps";

const USAGE_COLUMNS: [&str; 4] = ["month", "article_code", "article_group", "count"];
const RANKED_COLUMNS: [&str; 4] = ["month", "rank", "article_code", "count"];
const JOINED_COLUMNS: [&str; 4] = ["order_id", "article_code", "article_group", "month"];

static UNSAFE_NAME_CHARS: OnceLock<Regex> = OnceLock::new();

pub fn joined_file(archive_dir: &Path, year: i32) -> PathBuf {
    archive_dir.join(format!("merged_{year}.csv"))
}

pub fn usage_file(archive_dir: &Path, year: i32) -> PathBuf {
    archive_dir.join(format!("usage_counts_{year}.csv"))
}

pub fn ranking_dir(archive_dir: &Path, mode: RankMode, top_n: usize, year: i32) -> PathBuf {
    archive_dir.join(format!("top_{top_n}_per_{}_{year}", mode.label()))
}

/// Creates the archive directory when it does not exist yet.
pub fn ensure_archive_dir(archive_dir: &Path) -> Result<()> {
    fs::create_dir_all(archive_dir)
        .with_context(|| format!("Creating archive directory {archive_dir:?}"))
}

/// Fails unless `path` exists; used for inputs produced by an earlier run.
pub fn require_existing(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(UsageError::MissingResource(path.to_path_buf()).into())
    }
}

pub fn write_joined(path: &Path, rows: &[JoinedRow]) -> Result<()> {
    let mut writer = io_utils::open_csv_writer(path, io_utils::DEFAULT_CSV_DELIMITER)?;
    writer
        .write_record(JOINED_COLUMNS)
        .context("Writing merged headers")?;
    for row in rows {
        let month = row.month.map(|m| m.to_string()).unwrap_or_default();
        writer
            .write_record([
                row.order_id.as_str(),
                row.article_code.as_str(),
                row.article_group.as_deref().unwrap_or(""),
                month.as_str(),
            ])
            .context("Writing merged row")?;
    }
    writer.flush().context("Flushing merged rows")?;
    info!("Wrote {} merged row(s) to {:?}", rows.len(), path);
    Ok(())
}

pub fn write_usage(path: &Path, usage: &[UsageCount]) -> Result<()> {
    let mut writer = io_utils::open_csv_writer(path, io_utils::DEFAULT_CSV_DELIMITER)?;
    writer
        .write_record(USAGE_COLUMNS)
        .context("Writing usage headers")?;
    for row in usage {
        writer
            .write_record([
                row.month.to_string().as_str(),
                row.article_code.as_str(),
                row.article_group.as_deref().unwrap_or(""),
                row.count.to_string().as_str(),
            ])
            .context("Writing usage row")?;
    }
    writer.flush().context("Flushing usage table")?;
    info!("Wrote {} usage row(s) to {:?}", usage.len(), path);
    Ok(())
}

/// Reads a usage table written by [`write_usage`]; an empty group cell is a
/// missing group.
pub fn read_usage(path: &Path) -> Result<Vec<UsageCount>> {
    require_existing(path)?;
    let mut reader = io_utils::open_csv_reader_from_path(path, io_utils::DEFAULT_CSV_DELIMITER)?;
    let rows = loader::read_table(&mut reader, "usage_counts", &USAGE_COLUMNS, UTF_8)
        .with_context(|| format!("Reading usage table {path:?}"))?;
    rows.into_iter()
        .enumerate()
        .map(|(idx, cells)| {
            parse_usage_row(&cells).with_context(|| format!("Usage row {} in {path:?}", idx + 2))
        })
        .collect()
}

fn parse_usage_row(cells: &[String]) -> Result<UsageCount> {
    let month: u32 = cells[0]
        .trim()
        .parse()
        .with_context(|| format!("Failed to parse month '{}'", cells[0]))?;
    if !chart::MONTHS.contains(&month) {
        return Err(anyhow!("Month {month} is outside 1..=12"));
    }
    let count: u64 = cells[3]
        .trim()
        .parse()
        .with_context(|| format!("Failed to parse count '{}'", cells[3]))?;
    let group = cells[2].trim();
    Ok(UsageCount {
        month,
        article_code: cells[1].clone(),
        article_group: (!group.is_empty()).then(|| group.to_string()),
        count,
    })
}

pub fn write_ranked(path: &Path, ranked: &[RankedUsage]) -> Result<()> {
    let mut writer = io_utils::open_csv_writer(path, io_utils::DEFAULT_CSV_DELIMITER)?;
    writer
        .write_record(RANKED_COLUMNS)
        .context("Writing ranking headers")?;
    for row in ranked {
        writer
            .write_record([
                row.month.to_string().as_str(),
                row.rank.to_string().as_str(),
                row.article_code.as_str(),
                row.count.to_string().as_str(),
            ])
            .context("Writing ranking row")?;
    }
    writer.flush().context("Flushing ranking")?;
    debug!("Wrote {} ranked row(s) to {:?}", ranked.len(), path);
    Ok(())
}

pub fn write_pivot(path: &Path, pivot: &Pivot) -> Result<()> {
    let mut writer = io_utils::open_csv_writer(path, io_utils::DEFAULT_CSV_DELIMITER)?;
    writer
        .write_record(pivot.header())
        .context("Writing chart headers")?;
    for record in pivot.records() {
        writer.write_record(&record).context("Writing chart row")?;
    }
    writer.flush().context("Flushing chart matrix")?;
    debug!("Wrote chart matrix {:?}", path);
    Ok(())
}

/// Replaces characters that are invalid in sheet or file names and trims the
/// result to the sheet name length limit.
pub fn safe_partition_name(group: Option<&str>) -> String {
    let regex = UNSAFE_NAME_CHARS.get_or_init(|| {
        Regex::new(r#"[\[\]:*?/\\<>|"\x00-\x1f]"#).expect("partition name pattern is valid")
    });
    let raw = group.map(str::trim).filter(|g| !g.is_empty()).unwrap_or(UNASSIGNED_GROUP);
    let replaced = regex.replace_all(raw, "_");
    replaced.chars().take(MAX_PARTITION_NAME_LEN).collect()
}

/// Unique partition names for `groups`, in the given order.
///
/// Names compare case-insensitively, like sheet names. A name that is already
/// taken gets a `~2`, `~3`, ... suffix, shortening the name so the result
/// still fits the length limit.
pub fn partition_names(groups: &[Option<String>]) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    groups
        .iter()
        .map(|group| {
            let base = safe_partition_name(group.as_deref());
            let mut candidate = base.clone();
            let mut counter = 2usize;
            while used.contains(&candidate.to_lowercase()) {
                let suffix = format!("~{counter}");
                let keep = MAX_PARTITION_NAME_LEN - suffix.chars().count();
                candidate = base.chars().take(keep).collect::<String>() + &suffix;
                counter += 1;
            }
            used.insert(candidate.to_lowercase());
            candidate
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupPartition {
    pub group: Option<String>,
    pub name: String,
    pub ranking: PathBuf,
    pub heatmap: PathBuf,
}

/// Writes one ranking per article group into `dir` and one heatmap matrix per
/// group into `dir/heatmaps`, both named after the partition.
pub fn write_group_partitions(dir: &Path, ranked: &[RankedUsage]) -> Result<Vec<GroupPartition>> {
    let heatmap_dir = dir.join(HEATMAP_DIR);
    fs::create_dir_all(&heatmap_dir)
        .with_context(|| format!("Creating output directory {heatmap_dir:?}"))?;
    let groups = rank::split_by_group(ranked);
    let names = partition_names(
        &groups
            .iter()
            .map(|(group, _)| group.clone())
            .collect::<Vec<_>>(),
    );
    let mut partitions = Vec::with_capacity(groups.len());
    for ((group, rows), name) in groups.into_iter().zip(names) {
        let ranking = dir.join(format!("{name}.csv"));
        let heatmap = heatmap_dir.join(format!("{name}.csv"));
        write_ranked(&ranking, &rows)?;
        write_pivot(&heatmap, &chart::heatmap_pivot(&rows))?;
        partitions.push(GroupPartition {
            group,
            name,
            ranking,
            heatmap,
        });
    }
    info!(
        "Wrote {} group partition(s) to {:?}",
        partitions.len(),
        dir
    );
    Ok(partitions)
}

/// Writes the global monthly ranking and its line chart matrix into `dir`.
pub fn write_month_ranking(
    dir: &Path,
    ranked: &[RankedUsage],
    top_n: usize,
    year: i32,
) -> Result<(PathBuf, PathBuf)> {
    fs::create_dir_all(dir).with_context(|| format!("Creating output directory {dir:?}"))?;
    let ranking = dir.join(format!("top_{top_n}_per_month_{year}.csv"));
    let line_chart = dir.join(format!("line_chart_{year}.csv"));
    write_ranked(&ranking, ranked)?;
    write_pivot(&line_chart, &chart::line_chart_pivot(ranked))?;
    info!("Wrote {} ranked row(s) to {:?}", ranked.len(), ranking);
    Ok((ranking, line_chart))
}
