use std::{cmp::Ordering, collections::HashMap};

use log::debug;

use crate::model::{UsageCount, UsageRow};

/// Orders article groups by name with the missing group last.
pub fn compare_groups(left: &Option<String>, right: &Option<String>) -> Ordering {
    match (left, right) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Canonical order of a usage table: month, article code, then group.
pub fn compare_usage_keys(left: &UsageCount, right: &UsageCount) -> Ordering {
    left.month
        .cmp(&right.month)
        .then_with(|| left.article_code.cmp(&right.article_code))
        .then_with(|| compare_groups(&left.article_group, &right.article_group))
}

/// Counts usage rows per (month, article code, article group).
///
/// A missing group is its own bucket. The result is in canonical key order,
/// so it does not depend on the order of `rows`.
pub fn count_usage<'a, I>(rows: I) -> Vec<UsageCount>
where
    I: IntoIterator<Item = &'a UsageRow>,
{
    let mut counts: HashMap<&UsageRow, u64> = HashMap::new();
    for row in rows {
        *counts.entry(row).or_insert(0) += 1;
    }
    let mut usage = counts
        .into_iter()
        .map(|(row, count)| UsageCount {
            month: row.month,
            article_code: row.article_code.clone(),
            article_group: row.article_group.clone(),
            count,
        })
        .collect::<Vec<_>>();
    usage.sort_by(compare_usage_keys);
    debug!("Aggregated usage into {} distinct key(s)", usage.len());
    usage
}
