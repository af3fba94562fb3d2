//! Left-outer joins from order/article links to catalog groups and order months.
//!
//! Both joins bucket the right-hand table by key and stream the left-hand rows
//! through it. Every left row is emitted at least once: unmatched rows carry a
//! missing group or month, and a key with several right-hand rows fans out into
//! one output row per match. Fan-out is kept as-is and reported so callers can
//! see that row counts grew.

use std::collections::{BTreeMap, HashMap};

use log::info;

use crate::{
    data::article_key,
    model::{CatalogEntry, GroupedLink, JoinedRow, MonthlyOrder, OrderArticleLink},
};

/// A join key that matched more than one right-hand row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanOut {
    pub key: String,
    pub matches: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinStats {
    /// Left rows that found at least one right-hand match.
    pub matched_rows: usize,
    /// Left rows emitted without a match.
    pub unmatched_rows: usize,
    /// Keys that produced more than one output row, sorted by key.
    pub fan_out: Vec<FanOut>,
}

impl JoinStats {
    pub fn has_matches(&self) -> bool {
        self.matched_rows > 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleGroupJoin {
    pub rows: Vec<GroupedLink>,
    pub stats: JoinStats,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonthJoin {
    pub rows: Vec<JoinedRow>,
    pub stats: JoinStats,
}

impl MonthJoin {
    /// Rows that can be aggregated, i.e. whose order fell into the target year.
    pub fn dated_rows(&self) -> impl Iterator<Item = &JoinedRow> {
        self.rows.iter().filter(|row| row.month.is_some())
    }
}

/// Links left-joined to the catalog on the lowercased article code.
pub fn join_article_groups(links: &[OrderArticleLink], catalog: &[CatalogEntry]) -> ArticleGroupJoin {
    let lookup = build_lookup(catalog, |entry| article_key(&entry.article_code));
    let mut tracker = JoinTracker::default();
    let mut rows = Vec::with_capacity(links.len());

    for link in links {
        let key = article_key(&link.article_code);
        match lookup.get(&key) {
            Some(bucket) => {
                tracker.matched(&key, bucket.len());
                rows.extend(bucket.iter().map(|entry| GroupedLink {
                    order_id: link.order_id.clone(),
                    article_code: link.article_code.clone(),
                    article_group: entry.article_group.clone(),
                }));
            }
            None => {
                tracker.unmatched();
                rows.push(GroupedLink {
                    order_id: link.order_id.clone(),
                    article_code: link.article_code.clone(),
                    article_group: None,
                });
            }
        }
    }

    let stats = tracker.finish();
    info!(
        "Article group join: {} output row(s), {} matched link(s), {} without group",
        rows.len(),
        stats.matched_rows,
        stats.unmatched_rows
    );
    ArticleGroupJoin { rows, stats }
}

/// Grouped links left-joined to the year's orders on the order id.
pub fn join_months(grouped: &[GroupedLink], orders: &[MonthlyOrder]) -> MonthJoin {
    let lookup = build_lookup(orders, |order| order.order_id.clone());
    let mut tracker = JoinTracker::default();
    let mut rows = Vec::with_capacity(grouped.len());

    for link in grouped {
        match lookup.get(&link.order_id) {
            Some(bucket) => {
                tracker.matched(&link.order_id, bucket.len());
                rows.extend(bucket.iter().map(|order| JoinedRow {
                    order_id: link.order_id.clone(),
                    article_code: link.article_code.clone(),
                    article_group: link.article_group.clone(),
                    month: Some(order.month),
                }));
            }
            None => {
                tracker.unmatched();
                rows.push(JoinedRow {
                    order_id: link.order_id.clone(),
                    article_code: link.article_code.clone(),
                    article_group: link.article_group.clone(),
                    month: None,
                });
            }
        }
    }

    let stats = tracker.finish();
    info!(
        "Order month join: {} output row(s), {} dated, {} outside the year",
        rows.len(),
        stats.matched_rows,
        stats.unmatched_rows
    );
    MonthJoin { rows, stats }
}

fn build_lookup<T, F>(rows: &[T], key: F) -> HashMap<String, Vec<&T>>
where
    F: Fn(&T) -> String,
{
    let mut map: HashMap<String, Vec<&T>> = HashMap::new();
    for row in rows {
        map.entry(key(row)).or_default().push(row);
    }
    map
}

#[derive(Default)]
struct JoinTracker {
    matched_rows: usize,
    unmatched_rows: usize,
    fan_out: BTreeMap<String, usize>,
}

impl JoinTracker {
    fn matched(&mut self, key: &str, bucket_len: usize) {
        self.matched_rows += 1;
        if bucket_len > 1 && !self.fan_out.contains_key(key) {
            self.fan_out.insert(key.to_string(), bucket_len);
        }
    }

    fn unmatched(&mut self) {
        self.unmatched_rows += 1;
    }

    fn finish(self) -> JoinStats {
        JoinStats {
            matched_rows: self.matched_rows,
            unmatched_rows: self.unmatched_rows,
            fan_out: self
                .fan_out
                .into_iter()
                .map(|(key, matches)| FanOut { key, matches })
                .collect(),
        }
    }
}
