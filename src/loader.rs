//! Binds the three source tables to delimited files.
//!
//! Only the columns named by the [`ColumnMapping`] are read. A table without
//! one of its required columns is a fatal load error; short rows yield empty
//! cells.

use std::{
    io::Read,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use log::{debug, info};

use crate::{
    config::ColumnMapping,
    error::UsageError,
    io_utils,
    model::{RawCatalogEntry, RawOrder, RawOrderArticleLink, RawTables},
};

#[derive(Debug, Clone)]
pub struct SourcePaths {
    pub orders: PathBuf,
    pub links: PathBuf,
    pub catalog: PathBuf,
}

pub fn load_tables(
    paths: &SourcePaths,
    mapping: &ColumnMapping,
    delimiter: Option<u8>,
    encoding: &'static Encoding,
) -> Result<RawTables> {
    let orders = read_file(
        &paths.orders,
        "orders",
        &[&mapping.orders.order_id, &mapping.orders.production_end],
        delimiter,
        encoding,
    )?
    .into_iter()
    .map(|mut cells| RawOrder {
        production_end: cells.pop().unwrap_or_default(),
        order_id: cells.pop().unwrap_or_default(),
    })
    .collect::<Vec<_>>();

    let links = read_file(
        &paths.links,
        "order_articles",
        &[&mapping.links.order_id, &mapping.links.article_code],
        delimiter,
        encoding,
    )?
    .into_iter()
    .map(|mut cells| RawOrderArticleLink {
        article_code: cells.pop().unwrap_or_default(),
        order_id: cells.pop().unwrap_or_default(),
    })
    .collect::<Vec<_>>();

    let catalog = read_file(
        &paths.catalog,
        "article_groups",
        &[&mapping.catalog.article_code, &mapping.catalog.article_group],
        delimiter,
        encoding,
    )?
    .into_iter()
    .map(|mut cells| RawCatalogEntry {
        article_group: cells.pop().unwrap_or_default(),
        article_code: cells.pop().unwrap_or_default(),
    })
    .collect::<Vec<_>>();

    info!(
        "Loaded {} order(s), {} order/article link(s), {} catalog row(s)",
        orders.len(),
        links.len(),
        catalog.len()
    );
    Ok(RawTables {
        orders,
        links,
        catalog,
    })
}

fn read_file(
    path: &Path,
    table: &str,
    columns: &[&str],
    delimiter: Option<u8>,
    encoding: &'static Encoding,
) -> Result<Vec<Vec<String>>> {
    if !path.exists() {
        return Err(UsageError::MissingResource(path.to_path_buf()).into());
    }
    let delimiter = io_utils::resolve_input_delimiter(path, delimiter);
    debug!(
        "Reading table '{table}' from {path:?} (delimiter '{}')",
        crate::printable_delimiter(delimiter)
    );
    let mut reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
    read_table(&mut reader, table, columns, encoding)
        .with_context(|| format!("Reading table '{table}' from {path:?}"))
}

/// Reads the requested columns, in the requested order, from every data row.
pub fn read_table<R: Read>(
    reader: &mut csv::Reader<R>,
    table: &str,
    columns: &[&str],
    encoding: &'static Encoding,
) -> Result<Vec<Vec<String>>> {
    let headers = io_utils::reader_headers(reader, encoding)?;
    let indices = columns
        .iter()
        .map(|name| {
            headers
                .iter()
                .position(|header| header == name)
                .ok_or_else(|| UsageError::MissingColumn {
                    table: table.to_string(),
                    column: name.to_string(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut rows = Vec::new();
    for (row_idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", row_idx + 2))?;
        let decoded = io_utils::decode_record(&record, encoding)
            .with_context(|| format!("Decoding row {}", row_idx + 2))?;
        rows.push(
            indices
                .iter()
                .map(|idx| decoded.get(*idx).cloned().unwrap_or_default())
                .collect(),
        );
    }
    Ok(rows)
}
