#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use article_usage::model::{RawCatalogEntry, RawOrder, RawOrderArticleLink, RawTables};
use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}

/// Source files of a small production year.
pub struct SampleSources {
    pub orders: PathBuf,
    pub links: PathBuf,
    pub catalog: PathBuf,
}

/// Three orders in 2024 (March, March, July), one in 2023 and one without a
/// readable end date. `X9` has no catalog entry.
pub fn write_sample_sources(workspace: &TestWorkspace) -> SampleSources {
    let orders = workspace.write(
        "orders.csv",
        "order_id,production_end\n\
         A1,2024-03-15\n\
         A2,15.03.2024 14:00\n\
         A3,2024-07-01\n\
         B1,2023-12-31\n\
         C1,unknown\n",
    );
    let links = workspace.write(
        "order_articles.csv",
        "order_id,article_code\n\
         A1,X1\n\
         A1,X2\n\
         A2,x1\n\
         A2,X9\n\
         A3,X2\n\
         B1,X1\n\
         C1,X1\n",
    );
    let catalog = workspace.write(
        "articles.csv",
        "article_code,article_group\n\
         x1,Fasteners\n\
         X2,Seals\n",
    );
    SampleSources {
        orders,
        links,
        catalog,
    }
}

pub fn raw_tables(
    orders: &[(&str, &str)],
    links: &[(&str, &str)],
    catalog: &[(&str, &str)],
) -> RawTables {
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
