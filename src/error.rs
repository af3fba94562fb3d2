use std::path::PathBuf;

use thiserror::Error;

use crate::config::{TOP_N_RANGE, YEAR_RANGE};

/// Failures that stop a run before or while the source tables are bound.
///
/// Anomalies inside the pipeline itself (empty year, catalog fan-out) are not
/// errors; they are reported as [`crate::pipeline::PipelineWarning`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    #[error(
        "Year {0} is outside the supported range {min}..={max}",
        min = YEAR_RANGE.start(),
        max = YEAR_RANGE.end()
    )]
    YearOutOfRange(i32),

    #[error(
        "Top-N count {0} is outside the supported range {min}..={max}",
        min = TOP_N_RANGE.start(),
        max = TOP_N_RANGE.end()
    )]
    TopNOutOfRange(usize),

    #[error("Table '{table}' is missing required column '{column}'")]
    MissingColumn { table: String, column: String },

    #[error("Required resource not found: {}", .0.display())]
    MissingResource(PathBuf),
}
