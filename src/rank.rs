//! Top-N selection over usage counts.
//!
//! Within a partition rows are ordered by count, highest first. Equal counts
//! keep the order in which they appear in the input table, and ranks are
//! consecutive from 1 with no gaps or shared places. Partitions are truncated
//! to `top_n` independently, so a busy group never displaces a quiet one.

use std::cmp::Ordering;

use itertools::Itertools;
use serde::Serialize;

use crate::{
    aggregate::compare_groups,
    model::{RankedUsage, UsageCount},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RankMode {
    /// One partition per month across all article groups.
    Month,
    /// One partition per (article group, month).
    Group,
}

impl RankMode {
    pub fn label(self) -> &'static str {
        match self {
            RankMode::Month => "month",
            RankMode::Group => "group",
        }
    }

    fn compare_partitions(self, left: &UsageCount, right: &UsageCount) -> Ordering {
        match self {
            RankMode::Month => left.month.cmp(&right.month),
            RankMode::Group => compare_groups(&left.article_group, &right.article_group)
                .then_with(|| left.month.cmp(&right.month)),
        }
    }

    fn partition_key(self, usage: &UsageCount) -> (Option<&Option<String>>, u32) {
        match self {
            RankMode::Month => (None, usage.month),
            RankMode::Group => (Some(&usage.article_group), usage.month),
        }
    }
}

/// Ranks every partition of `usage` and keeps at most `top_n` rows of each.
///
/// Output is ordered by partition, then rank. In [`RankMode::Group`] the
/// partitions run through the groups by name (missing group last), and
/// through the months within each group.
pub fn rank_top_n(usage: &[UsageCount], mode: RankMode, top_n: usize) -> Vec<RankedUsage> {
    let mut ordered = usage.iter().collect::<Vec<_>>();
    // Stable: equal counts stay in input order.
    ordered.sort_by(|a, b| {
        mode.compare_partitions(a, b)
            .then_with(|| b.count.cmp(&a.count))
    });

    let mut ranked = Vec::new();
    for (_, partition) in &ordered.into_iter().chunk_by(|u| mode.partition_key(*u)) {
        ranked.extend(partition.take(top_n).enumerate().map(|(idx, u)| RankedUsage {
            month: u.month,
            rank: idx + 1,
            article_code: u.article_code.clone(),
            article_group: u.article_group.clone(),
            count: u.count,
        }));
    }
    ranked
}

/// Splits a ranked table into one slice per article group, in table order.
pub fn split_by_group(ranked: &[RankedUsage]) -> Vec<(Option<String>, Vec<RankedUsage>)> {
    let mut groups: Vec<(Option<String>, Vec<RankedUsage>)> = Vec::new();
    for row in ranked {
        match groups.iter_mut().find(|(group, _)| *group == row.article_group) {
            Some((_, rows)) => rows.push(row.clone()),
            None => groups.push((row.article_group.clone(), vec![row.clone()])),
        }
    }
    groups.sort_by(|a, b| compare_groups(&a.0, &b.0));
    groups
}
