//! Chart-ready pivots of ranked usage.
//!
//! Rendering is left to whatever charting tool reads the exported matrices;
//! this module only fixes their shape. Both pivots always carry all twelve
//! months and fill missing cells with zero.

use std::collections::{BTreeMap, BTreeSet};

use crate::model::RankedUsage;

pub const MONTHS: std::ops::RangeInclusive<u32> = 1..=12;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pivot {
    /// Name of the row label column, e.g. `month`.
    pub corner: String,
    pub row_labels: Vec<String>,
    pub column_labels: Vec<String>,
    pub cells: Vec<Vec<u64>>,
}

impl Pivot {
    pub fn header(&self) -> Vec<String> {
        std::iter::once(self.corner.clone())
            .chain(self.column_labels.iter().cloned())
            .collect()
    }

    pub fn records(&self) -> impl Iterator<Item = Vec<String>> + '_ {
        self.row_labels.iter().zip(&self.cells).map(|(label, row)| {
            std::iter::once(label.clone())
                .chain(row.iter().map(u64::to_string))
                .collect()
        })
    }
}

/// Months as rows, article codes as columns: one line per article.
///
/// An article ranked under several groups in the same month contributes the
/// sum of its counts.
pub fn line_chart_pivot(ranked: &[RankedUsage]) -> Pivot {
    let articles = ranked
        .iter()
        .map(|r| r.article_code.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect::<Vec<_>>();
    let mut totals: BTreeMap<(u32, &str), u64> = BTreeMap::new();
    for row in ranked {
        *totals.entry((row.month, row.article_code.as_str())).or_insert(0) += row.count;
    }
    let cells = MONTHS
        .map(|month| {
            articles
                .iter()
                .map(|code| totals.get(&(month, code.as_str())).copied().unwrap_or(0))
                .collect()
        })
        .collect();
    Pivot {
        corner: "month".to_string(),
        row_labels: MONTHS.map(|m| m.to_string()).collect(),
        column_labels: articles,
        cells,
    }
}

/// Article codes as rows, months as columns: the grid of a heatmap.
pub fn heatmap_pivot(ranked: &[RankedUsage]) -> Pivot {
    let mut grid: BTreeMap<&str, [u64; 12]> = BTreeMap::new();
    for row in ranked {
        if !MONTHS.contains(&row.month) {
            continue;
        }
        grid.entry(row.article_code.as_str()).or_insert([0; 12])[(row.month - 1) as usize] +=
            row.count;
    }
    Pivot {
        corner: "article_code".to_string(),
        row_labels: grid.keys().map(|code| code.to_string()).collect(),
        column_labels: MONTHS.map(|m| m.to_string()).collect(),
        cells: grid.values().map(|months| months.to_vec()).collect(),
    }
}
