//! Diff results for a keyed comparison of two datasets.
//!
//! This module defines the types that cross the core boundary:
//! - [`CellDiff`]: one differing column value between two rows sharing a key
//! - [`RowDiff`]: the fate of one key (added, removed or modified)
//! - [`DiffSummary`]: aggregate counts for a run
//! - [`DiffReport`]: the versioned result of a run
//! - [`DiffError`]: fatal conditions that abort a run

use crate::compare::SchemaOnlyColumn;
use crate::config::{ComparisonConfig, ConfigError};
use crate::dataset::{CellValue, DatasetError, DatasetSide, Row};
use crate::error_codes;
use crate::key_index::{KeyIssue, KeyTuple};
use thiserror::Error;

/// Errors produced by diffing APIs.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DiffError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(
        "[TDIFF_DIFF_001] key column '{column}' not found in the {side} dataset. Available columns: {}. Suggestion: check the column identifier; multi-row headers are joined with '/'.",
        available.join(", ")
    )]
    MissingKeyColumn {
        column: String,
        side: DatasetSide,
        available: Vec<String>,
    },

    #[error(
        "[TDIFF_DIFF_002] key {key} appears more than once in the {side} dataset (rows {first_row} and {duplicate_row}). Suggestion: deduplicate the data or choose a first/last duplicate policy."
    )]
    DuplicateKey {
        side: DatasetSide,
        key: String,
        first_row: usize,
        duplicate_row: usize,
    },
}

impl DiffError {
    pub fn code(&self) -> &'static str {
        match self {
            DiffError::Config(e) => e.code(),
            DiffError::Dataset(e) => e.code(),
            DiffError::MissingKeyColumn { .. } => error_codes::DIFF_MISSING_KEY_COLUMN,
            DiffError::DuplicateKey { .. } => error_codes::DIFF_DUPLICATE_KEY,
        }
    }
}

/// A single differing column between the old and new row of one key.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CellDiff {
    /// Leaf identifier of the column.
    pub column: String,
    /// Column index in the old dataset.
    pub column_index: usize,
    pub old: CellValue,
    pub new: CellValue,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowDiff {
    /// Key exists only in the new dataset; `row` is the new snapshot.
    Added { key: KeyTuple, row: Row },
    /// Key exists only in the old dataset; `row` is the old snapshot.
    Removed { key: KeyTuple, row: Row },
    /// Key exists on both sides and at least one compared cell differs.
    Modified {
        key: KeyTuple,
        /// Source row index in the old dataset.
        old_row: usize,
        /// Source row index in the new dataset.
        new_row: usize,
        cells: Vec<CellDiff>,
    },
}

impl RowDiff {
    pub fn key(&self) -> &KeyTuple {
        match self {
            RowDiff::Added { key, .. } | RowDiff::Removed { key, .. } | RowDiff::Modified { key, .. } => key,
        }
    }

    /// Cell diffs of a modified row; empty for added and removed rows.
    pub fn cells(&self) -> &[CellDiff] {
        match self {
            RowDiff::Modified { cells, .. } => cells,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DiffSummary {
    pub old_rows: usize,
    pub new_rows: usize,
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
    pub unchanged: usize,
    /// Total cell diffs across all modified rows.
    pub modified_cells: usize,
    /// Rows excluded from comparison because a key component was blank (both sides).
    pub invalid_key_count: usize,
    /// Rows diverted because their key was already indexed (both sides).
    pub duplicate_key_count: usize,
}

/// The complete, immutable result of one comparison run.
///
/// Row lists are ordered deterministically:
/// - `added` follows the new dataset's row order
/// - `removed` and `modified` follow the old dataset's row order
///
/// Unchanged rows are only counted in [`DiffSummary::unchanged`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DiffReport {
    /// Schema version (currently "1").
    pub version: String,
    pub summary: DiffSummary,
    /// Leaf identifiers of the old dataset, in dataset order; `Row::values` of removed rows
    /// align with this list.
    pub old_columns: Vec<String>,
    /// Leaf identifiers of the new dataset; added rows align with this list.
    pub new_columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schema_only_columns: Vec<SchemaOnlyColumn>,
    pub added: Vec<RowDiff>,
    pub removed: Vec<RowDiff>,
    pub modified: Vec<RowDiff>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_issues: Vec<KeyIssue>,
    /// Human-readable notes about non-fatal conditions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// The configuration the run used, echoed back.
    pub config: ComparisonConfig,
}

impl DiffReport {
    pub const SCHEMA_VERSION: &'static str = "1";

    /// `true` when any key was added, removed or modified.
    pub fn has_differences(&self) -> bool {
        !(self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty())
    }

    pub fn key_columns(&self) -> &[String] {
        &self.config.key_columns
    }

    pub fn ignored_columns(&self) -> &[String] {
        &self.config.ignore_columns
    }
}
