//! Table Diff: key-based comparison of two tabular datasets.
//!
//! This crate provides functionality for:
//! - Flattening multi-row (merged) header blocks into stable column identifiers
//! - Correlating rows of two datasets by a configurable key
//! - Semantic cell comparison (trimmed text, numeric tolerance, date granularity)
//! - Producing a deterministic [`DiffReport`] and serializing it to JSON
//!
//! # Quick Start
//!
//! ```ignore
//! use table_diff::{ComparisonConfig, Dataset, diff_datasets};
//!
//! let old = Dataset::from_sheet(&old_rows, 0, 1)?;
//! let new = Dataset::from_sheet(&new_rows, 0, 1)?;
//! let config = ComparisonConfig::builder().key_column("id").build()?;
//! let report = diff_datasets(&old, &new, &config)?;
//!
//! for row in &report.modified {
//!     println!("{:?}", row);
//! }
//! ```

mod compare;
mod config;
mod dataset;
mod diff;
mod engine;
pub mod error_codes;
pub(crate) mod hashing;
mod header;
mod key_index;
mod matcher;
mod output;
mod progress;
mod report;

pub use compare::{
    ColumnPlan, ComparedColumn, SchemaOnlyColumn, compare_common_rows, compare_rows,
    plan_columns, values_equivalent,
};
pub use config::{
    ComparisonConfig, ComparisonConfigBuilder, ConfigError, DEFAULT_ABSOLUTE_EPSILON,
    DEFAULT_RELATIVE_EPSILON, DateGranularity, DuplicateKeyPolicy, NumericTolerance,
};
pub use dataset::{CellValue, Column, Dataset, DatasetError, DatasetSide, Row};
pub use diff::{CellDiff, DiffError, DiffReport, DiffSummary, RowDiff};
pub use engine::{diff_datasets, diff_datasets_with_progress};
pub use header::{HEADER_PATH_SEPARATOR, HeaderError, HeaderPath, resolve_headers};
pub use key_index::{IndexedRow, KeyIndex, KeyIssue, KeyTuple, build_key_index};
pub use matcher::{CommonRow, RowMatch, match_rows};
pub use output::json::{CellRecord, report_to_cell_records, serialize_diff_report};
pub use progress::{
    NoProgress, PHASE_ASSEMBLE, PHASE_COMPARE, PHASE_INDEX, PHASE_MATCH, ProgressCallback,
};
