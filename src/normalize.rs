use log::debug;

use crate::{
    data::{normalize_key, parse_production_end},
    model::{CatalogEntry, NormalizedTables, Order, OrderArticleLink, RawTables},
};

/// Unifies identifier representations and parses production end dates.
///
/// No row is dropped here: an unparseable date becomes `None` and an empty
/// group cell becomes a missing group. Rows are excluded later, by the stage
/// that needs the field.
pub fn normalize(raw: &RawTables) -> NormalizedTables {
    let orders = raw
        .orders
        .iter()
        .map(|order| Order {
            order_id: normalize_key(&order.order_id),
            production_end: parse_production_end(&order.production_end),
        })
        .collect::<Vec<_>>();
    let links = raw
        .links
        .iter()
        .map(|link| OrderArticleLink {
            order_id: normalize_key(&link.order_id),
            article_code: normalize_key(&link.article_code),
        })
        .collect();
    let catalog = raw
        .catalog
        .iter()
        .map(|entry| {
            let group = entry.article_group.trim();
            CatalogEntry {
                article_code: normalize_key(&entry.article_code),
                article_group: (!group.is_empty()).then(|| group.to_string()),
            }
        })
        .collect();

    let undated = orders.iter().filter(|o| o.production_end.is_none()).count();
    if undated > 0 {
        debug!("{undated} order(s) have no parseable production end");
    }
    NormalizedTables {
        orders,
        links,
        catalog,
    }
}
