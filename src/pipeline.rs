//! One configurable pipeline from raw source tables to usage counts.
//!
//! [`run`] chains normalization, the year filter, both joins and the
//! aggregation. Ranking is a separate pure step ([`crate::rank::rank_top_n`])
//! so one usage table can feed both ranking modes. Nothing here fails: data
//! anomalies are logged and returned as [`PipelineWarning`]s.

use std::fmt;

use log::{info, warn};
use serde::Serialize;

use crate::{
    aggregate::count_usage,
    config::PipelineConfig,
    join::{self, FanOut},
    model::{JoinedRow, RawTables, UsageCount, UsageRow},
    normalize::normalize,
    time_filter::filter_year,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineWarning {
    NoOrdersInYear { year: i32 },
    NoCatalogMatches,
    CatalogFanOut { article_key: String, matches: usize },
    OrderFanOut { order_id: String, matches: usize },
    NoDatedRows,
}

impl fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineWarning::NoOrdersInYear { year } => {
                write!(f, "no orders finished production in {year}")
            }
            PipelineWarning::NoCatalogMatches => {
                write!(f, "no article code matched the article group catalog")
            }
            PipelineWarning::CatalogFanOut {
                article_key,
                matches,
            } => write!(
                f,
                "article code '{article_key}' appears {matches} times in the catalog; its usages are counted once per entry"
            ),
            PipelineWarning::OrderFanOut { order_id, matches } => write!(
                f,
                "order '{order_id}' appears {matches} times in the year's orders; its articles are counted once per entry"
            ),
            PipelineWarning::NoDatedRows => {
                write!(f, "no order/article link belongs to an order of the target year")
            }
        }
    }
}

/// Row counts of each stage of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StageCounts {
    pub orders: usize,
    pub orders_in_year: usize,
    pub links: usize,
    pub catalog_rows: usize,
    pub grouped_rows: usize,
    pub links_without_group: usize,
    pub joined_rows: usize,
    pub dated_rows: usize,
    pub usage_keys: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutput {
    /// Join output including rows whose order lies outside the year.
    pub joined: Vec<JoinedRow>,
    pub usage: Vec<UsageCount>,
    pub counts: StageCounts,
    pub warnings: Vec<PipelineWarning>,
}

pub fn run(raw: &RawTables, config: &PipelineConfig) -> PipelineOutput {
    let mut warnings = Vec::new();
    let tables = normalize(raw);

    let monthly = filter_year(&tables.orders, config.year);
    if monthly.is_empty() {
        warnings.push(PipelineWarning::NoOrdersInYear { year: config.year });
    }

    let grouped = join::join_article_groups(&tables.links, &tables.catalog);
    if !grouped.stats.has_matches() {
        warnings.push(PipelineWarning::NoCatalogMatches);
    }
    warnings.extend(grouped.stats.fan_out.iter().map(|FanOut { key, matches }| {
        PipelineWarning::CatalogFanOut {
            article_key: key.clone(),
            matches: *matches,
        }
    }));

    let joined = join::join_months(&grouped.rows, &monthly);
    if !joined.stats.has_matches() {
        warnings.push(PipelineWarning::NoDatedRows);
    }
    warnings.extend(joined.stats.fan_out.iter().map(|FanOut { key, matches }| {
        PipelineWarning::OrderFanOut {
            order_id: key.clone(),
            matches: *matches,
        }
    }));

    let usage_rows = joined
        .dated_rows()
        .filter_map(JoinedRow::to_usage_row)
        .collect::<Vec<UsageRow>>();
    let usage = count_usage(&usage_rows);

    let counts = StageCounts {
        orders: tables.orders.len(),
        orders_in_year: monthly.len(),
        links: tables.links.len(),
        catalog_rows: tables.catalog.len(),
        grouped_rows: grouped.rows.len(),
        links_without_group: grouped.stats.unmatched_rows,
        joined_rows: joined.rows.len(),
        dated_rows: usage_rows.len(),
        usage_keys: usage.len(),
    };
    for warning in &warnings {
        warn!("{warning}");
    }
    info!(
        "Pipeline for {}: {} dated usage row(s) across {} article/month/group key(s)",
        config.year, counts.dated_rows, counts.usage_keys
    );

    PipelineOutput {
        joined: joined.rows,
        usage,
        counts,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RawCatalogEntry, RawOrder, RawOrderArticleLink};

    fn tables(orders: &[(&str, &str)], links: &[(&str, &str)], catalog: &[(&str, &str)]) -> RawTables {
        RawTables {
            orders: orders
                .iter()
                .map(|(id, end)| RawOrder {
                    order_id: id.to_string(),
                    production_end: end.to_string(),
                })
                .collect(),
            links: links
                .iter()
                .map(|(id, code)| RawOrderArticleLink {
                    order_id: id.to_string(),
                    article_code: code.to_string(),
                })
                .collect(),
            catalog: catalog
                .iter()
                .map(|(code, group)| RawCatalogEntry {
                    article_code: code.to_string(),
                    article_group: group.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn run_counts_usages_and_keeps_ungrouped_articles() {
        let raw = tables(
            &[("A1", "2024-03-15"), ("A2", "2024-03-20"), ("A3", "2023-01-01")],
            &[("A1", "X1"), ("A2", "x1"), ("A2", "X2"), ("A3", "X1")],
            &[("x1", "G1")],
        );
        let config = PipelineConfig::new(2024, 10).unwrap();
        let output = run(&raw, &config);

        let usage = output
            .usage
            .iter()
            .map(|u| (u.month, u.article_code.as_str(), u.article_group.as_deref(), u.count))
            .collect::<Vec<_>>();
        assert_eq!(
            usage,
            vec![
                (3, "X1", Some("G1"), 1),
                (3, "X2", None, 1),
                (3, "x1", Some("G1"), 1),
            ]
        );
        assert_eq!(output.joined.len(), 4);
        assert_eq!(output.counts.dated_rows, 3);
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn run_warns_on_empty_year_without_failing() {
        let raw = tables(&[("A1", "2023-03-15")], &[("A1", "X1")], &[("X1", "G")]);
        let output = run(&raw, &PipelineConfig::new(2024, 1).unwrap());
        assert!(output.usage.is_empty());
        assert_eq!(
            output.warnings,
            vec![
                PipelineWarning::NoOrdersInYear { year: 2024 },
                PipelineWarning::NoDatedRows,
            ]
        );
    }

    #[test]
    fn run_reports_catalog_fan_out() {
        let raw = tables(
            &[("A1", "2024-01-05")],
            &[("A1", "X1")],
            &[("X1", "G1"), ("x1", "G2")],
        );
        let output = run(&raw, &PipelineConfig::new(2024, 1).unwrap());
        assert_eq!(output.usage.len(), 2);
        assert_eq!(
            output.warnings,
            vec![PipelineWarning::CatalogFanOut {
                article_key: "x1".to_string(),
                matches: 2,
            }]
        );
    }

    #[test]
    fn warnings_render_readable_messages() {
        let warning = PipelineWarning::NoOrdersInYear { year: 2031 };
        assert_eq!(warning.to_string(), "no orders finished production in 2031");
    }
}
