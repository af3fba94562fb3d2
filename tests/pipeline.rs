mod common;

use std::collections::{BTreeMap, HashSet};

use article_usage::{
    config::PipelineConfig,
    join,
    model::{RankedUsage, UsageCount},
    normalize::normalize,
    pipeline::{self, PipelineWarning},
    rank::{RankMode, rank_top_n},
};
use proptest::prelude::*;

use common::raw_tables;

fn usage_summary(usage: &[UsageCount]) -> Vec<(u32, &str, Option<&str>, u64)> {
    usage
        .iter()
        .map(|u| (u.month, u.article_code.as_str(), u.article_group.as_deref(), u.count))
        .collect()
}

#[test]
fn single_order_scenario_counts_and_ranks_both_articles() {
    let raw = raw_tables(
        &[("A1", "2024-03-15")],
        &[("A1", "X1"), ("A1", "X2")],
        &[("x1", "G1")],
    );
    let config = PipelineConfig::new(2024, 1).unwrap();
    let output = pipeline::run(&raw, &config);

    let joined = output
        .joined
        .iter()
        .map(|r| (r.month, r.article_code.as_str(), r.article_group.as_deref()))
        .collect::<Vec<_>>();
    assert_eq!(joined, vec![(Some(3), "X1", Some("G1")), (Some(3), "X2", None)]);
    assert_eq!(
        usage_summary(&output.usage),
        vec![(3, "X1", Some("G1"), 1), (3, "X2", None, 1)]
    );

    let ranked = rank_top_n(&output.usage, RankMode::Month, config.top_n);
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].month, 3);
    assert_eq!(ranked[0].rank, 1);
    assert_eq!(ranked[0].article_code, "X1");
}

#[test]
fn empty_year_yields_empty_tables_and_a_warning() {
    let raw = raw_tables(
        &[("A1", "2023-03-15"), ("A2", "garbage")],
        &[("A1", "X1")],
        &[("X1", "G1")],
    );
    let config = PipelineConfig::new(2024, 10).unwrap();
    let output = pipeline::run(&raw, &config);

    assert!(output.usage.is_empty());
    assert!(rank_top_n(&output.usage, RankMode::Month, 10).is_empty());
    assert!(rank_top_n(&output.usage, RankMode::Group, 10).is_empty());
    assert!(
        output
            .warnings
            .contains(&PipelineWarning::NoOrdersInYear { year: 2024 })
    );
}

#[test]
fn completely_empty_inputs_do_not_fail() {
    let raw = raw_tables(&[], &[], &[]);
    let output = pipeline::run(&raw, &PipelineConfig::new(2024, 3).unwrap());
    assert!(output.joined.is_empty());
    assert!(output.usage.is_empty());
    assert_eq!(
        output.warnings,
        vec![
            PipelineWarning::NoOrdersInYear { year: 2024 },
            PipelineWarning::NoCatalogMatches,
            PipelineWarning::NoDatedRows,
        ]
    );
}

#[test]
fn numeric_and_text_order_ids_join() {
    let raw = raw_tables(
        &[("1001.0", "2024-05-02")],
        &[("1001", "X1"), (" 1001 ", "X1")],
        &[("X1", "G1")],
    );
    let output = pipeline::run(&raw, &PipelineConfig::new(2024, 3).unwrap());
    assert_eq!(usage_summary(&output.usage), vec![(5, "X1", Some("G1"), 2)]);
}

#[test]
fn duplicate_orders_fan_out_and_are_reported() {
    let raw = raw_tables(
        &[("A1", "2024-01-10"), ("A1", "2024-02-10")],
        &[("A1", "X1")],
        &[("X1", "G1")],
    );
    let output = pipeline::run(&raw, &PipelineConfig::new(2024, 3).unwrap());
    assert_eq!(
        usage_summary(&output.usage),
        vec![(1, "X1", Some("G1"), 1), (2, "X1", Some("G1"), 1)]
    );
    assert_eq!(
        output.warnings,
        vec![PipelineWarning::OrderFanOut {
            order_id: "A1".to_string(),
            matches: 2,
        }]
    );
}

fn date_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        8 => (2023i32..=2025, 1u32..=12, 1u32..=28)
            .prop_map(|(y, m, d)| format!("{y}-{m:02}-{d:02}")),
        1 => Just(String::from("not a date")),
        1 => Just(String::new()),
    ]
}

fn raw_strategy() -> impl Strategy<Value = article_usage::model::RawTables> {
    let orders = proptest::collection::vec(("O[0-9]", date_strategy()), 0..12);
    let links = proptest::collection::vec(("O[0-9]", "[ABab][0-3]"), 0..40);
    let catalog = proptest::collection::vec(("[ABab][0-3]", "G[0-2]"), 0..8);
    (orders, links, catalog).prop_map(|(orders, links, catalog)| {
        let orders = orders
            .iter()
            .map(|(a, b)| (a.as_str(), b.as_str()))
            .collect::<Vec<_>>();
        let links = links
            .iter()
            .map(|(a, b)| (a.as_str(), b.as_str()))
            .collect::<Vec<_>>();
        let catalog = catalog
            .iter()
            .map(|(a, b)| (a.as_str(), b.as_str()))
            .collect::<Vec<_>>();
        raw_tables(&orders, &links, &catalog)
    })
}

fn usage_strategy() -> impl Strategy<Value = Vec<UsageCount>> {
    proptest::collection::btree_map(
        (1u32..=12, "[A-D][0-4]", proptest::option::of("G[0-3]")),
        1u64..20,
        0..60,
    )
    .prop_map(|counts| {
        counts
            .into_iter()
            .map(|((month, article_code, article_group), count)| UsageCount {
                month,
                article_code,
                article_group,
                count,
            })
            .collect()
    })
}

fn assert_well_ranked(ranked: &[RankedUsage], mode: RankMode, top_n: usize) {
    let mut partitions: BTreeMap<(Option<Option<String>>, u32), Vec<&RankedUsage>> =
        BTreeMap::new();
    for row in ranked {
        let group = match mode {
            RankMode::Month => None,
            RankMode::Group => Some(row.article_group.clone()),
        };
        partitions.entry((group, row.month)).or_default().push(row);
    }
    for rows in partitions.values() {
        assert!(rows.len() <= top_n);
        let ranks = rows.iter().map(|r| r.rank).collect::<Vec<_>>();
        assert_eq!(ranks, (1..=rows.len()).collect::<Vec<_>>());
        assert!(rows.windows(2).all(|pair| pair[0].count >= pair[1].count));
    }
}

proptest! {
    #[test]
    fn usage_counts_match_a_recount_of_the_join(raw in raw_strategy(), year in 2023i32..=2025) {
        let output = pipeline::run(&raw, &PipelineConfig::new(year, 5).unwrap());
        let mut recount: BTreeMap<(u32, String, Option<String>), u64> = BTreeMap::new();
        for row in &output.joined {
            if let Some(month) = row.month {
                *recount
                    .entry((month, row.article_code.clone(), row.article_group.clone()))
                    .or_insert(0) += 1;
            }
        }
        prop_assert_eq!(output.usage.len(), recount.len());
        for usage in &output.usage {
            let key = (usage.month, usage.article_code.clone(), usage.article_group.clone());
            prop_assert_eq!(recount.get(&key).copied(), Some(usage.count));
        }
    }

    #[test]
    fn every_link_without_catalog_match_survives_once(raw in raw_strategy()) {
        let tables = normalize(&raw);
        let grouped = join::join_article_groups(&tables.links, &tables.catalog);
        let catalog_keys = tables
            .catalog
            .iter()
            .map(|entry| entry.article_code.to_lowercase())
            .collect::<HashSet<_>>();
        let mut expected: BTreeMap<(String, String), usize> = BTreeMap::new();
        for link in &tables.links {
            if !catalog_keys.contains(&link.article_code.to_lowercase()) {
                *expected
                    .entry((link.order_id.clone(), link.article_code.clone()))
                    .or_insert(0) += 1;
            }
        }
        let mut actual: BTreeMap<(String, String), usize> = BTreeMap::new();
        for row in grouped.rows.iter().filter(|row| row.article_group.is_none()) {
            *actual
                .entry((row.order_id.clone(), row.article_code.clone()))
                .or_insert(0) += 1;
        }
        prop_assert_eq!(actual, expected);
        prop_assert_eq!(
            grouped.stats.unmatched_rows,
            tables.links.len() - grouped.stats.matched_rows
        );
    }

    #[test]
    fn ranks_are_gapless_with_non_increasing_counts(usage in usage_strategy(), top_n in 1usize..6) {
        for mode in [RankMode::Month, RankMode::Group] {
            let ranked = rank_top_n(&usage, mode, top_n);
            assert_well_ranked(&ranked, mode, top_n);
        }
    }

    #[test]
    fn group_rankings_ignore_other_groups(usage in usage_strategy(), top_n in 1usize..6) {
        let full = rank_top_n(&usage, RankMode::Group, top_n);
        let target = Some("G1".to_string());
        let only_target = usage
            .iter()
            .filter(|u| u.article_group == target)
            .cloned()
            .collect::<Vec<_>>();
        let isolated = rank_top_n(&only_target, RankMode::Group, top_n);
        let from_full = full
            .into_iter()
            .filter(|r| r.article_group == target)
            .collect::<Vec<_>>();
        prop_assert_eq!(from_full, isolated);
    }

    #[test]
    fn pipeline_is_idempotent(raw in raw_strategy(), top_n in 1usize..4) {
        let config = PipelineConfig::new(2024, top_n).unwrap();
        let first = pipeline::run(&raw, &config);
        let second = pipeline::run(&raw, &config);
        prop_assert_eq!(&first, &second);
        for mode in [RankMode::Month, RankMode::Group] {
            prop_assert_eq!(
                rank_top_n(&first.usage, mode, top_n),
                rank_top_n(&second.usage, mode, top_n)
            );
        }
    }
}
