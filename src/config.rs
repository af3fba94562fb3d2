//! Run parameters and source column naming.
//!
//! [`PipelineConfig`] replaces the interactive year / Top-N prompts of a
//! spreadsheet workflow with an explicit, validated value that is passed into
//! [`crate::pipeline::run`]. [`ColumnMapping`] binds the logical columns of the
//! three source tables to the header names found in the exported files and
//! can be loaded from a YAML document.

use std::{fs::File, io::BufReader, ops::RangeInclusive, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::UsageError;

pub const YEAR_RANGE: RangeInclusive<i32> = 2000..=2100;
pub const TOP_N_RANGE: RangeInclusive<usize> = 1..=5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PipelineConfig {
    pub year: i32,
    pub top_n: usize,
}

impl PipelineConfig {
    pub fn new(year: i32, top_n: usize) -> Result<Self, UsageError> {
        validate_year(year)?;
        if !TOP_N_RANGE.contains(&top_n) {
            return Err(UsageError::TopNOutOfRange(top_n));
        }
        Ok(Self { year, top_n })
    }
}

pub fn validate_year(year: i32) -> Result<i32, UsageError> {
    if YEAR_RANGE.contains(&year) {
        Ok(year)
    } else {
        Err(UsageError::YearOutOfRange(year))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrderColumns {
    pub order_id: String,
    pub production_end: String,
}

impl Default for OrderColumns {
    fn default() -> Self {
        Self {
            order_id: "order_id".to_string(),
            production_end: "production_end".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinkColumns {
    pub order_id: String,
    pub article_code: String,
}

impl Default for LinkColumns {
    fn default() -> Self {
        Self {
            order_id: "order_id".to_string(),
            article_code: "article_code".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogColumns {
    pub article_code: String,
    pub article_group: String,
}

impl Default for CatalogColumns {
    fn default() -> Self {
        Self {
            article_code: "article_code".to_string(),
            article_group: "article_group".to_string(),
        }
    }
}

/// Header names of the three source tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnMapping {
    pub orders: OrderColumns,
    pub links: LinkColumns,
    pub catalog: CatalogColumns,
}

impl ColumnMapping {
    pub fn load(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("Opening column mapping {path:?}"))?;
        let mapping = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing column mapping YAML {path:?}"))?;
        Ok(mapping)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
