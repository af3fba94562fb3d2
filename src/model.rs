//! Record types flowing through the usage pipeline.
//!
//! `Raw*` records are what the loader hands over: every cell is the string
//! found in the source file. The normalizer turns them into [`Order`],
//! [`OrderArticleLink`] and [`CatalogEntry`]; every later stage produces a new
//! table of derived records and never mutates its input.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawOrder {
    pub order_id: String,
    pub production_end: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawOrderArticleLink {
    pub order_id: String,
    pub article_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCatalogEntry {
    pub article_code: String,
    pub article_group: String,
}

/// The three source tables as loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTables {
    pub orders: Vec<RawOrder>,
    pub links: Vec<RawOrderArticleLink>,
    pub catalog: Vec<RawCatalogEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub order_id: String,
    pub production_end: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderArticleLink {
    pub order_id: String,
    pub article_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub article_code: String,
    pub article_group: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedTables {
    pub orders: Vec<Order>,
    pub links: Vec<OrderArticleLink>,
    pub catalog: Vec<CatalogEntry>,
}

/// An order whose production ended inside the target year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyOrder {
    pub order_id: String,
    pub month: u32,
}

/// An order/article link enriched with its catalog group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupedLink {
    pub order_id: String,
    pub article_code: String,
    pub article_group: Option<String>,
}

/// Output of the order/month join, before rows without a month are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedRow {
    pub order_id: String,
    pub article_code: String,
    pub article_group: Option<String>,
    pub month: Option<u32>,
}

impl JoinedRow {
    pub fn to_usage_row(&self) -> Option<UsageRow> {
        self.month.map(|month| UsageRow {
            month,
            article_code: self.article_code.clone(),
            article_group: self.article_group.clone(),
        })
    }
}

/// One (order, article) pairing counted in its order's production month.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UsageRow {
    pub month: u32,
    pub article_code: String,
    pub article_group: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageCount {
    pub month: u32,
    pub article_code: String,
    pub article_group: Option<String>,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedUsage {
    pub month: u32,
    pub rank: usize,
    pub article_code: String,
    pub article_group: Option<String>,
    pub count: u64,
}
