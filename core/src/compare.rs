//! Semantic cell comparison for rows that share a key.
//!
//! Values are normalized before comparison:
//! - strings are trimmed, and a blank string is the same as `Null`
//! - with `coerce_numeric_text`, a string that parses as a finite number compares as that
//!   number, so `1`, `1.0` and `"1"` are equal
//! - numbers compare under [`NumericTolerance`](crate::config::NumericTolerance)
//! - dates compare by instant after truncation to the configured granularity
//!
//! Values of different kinds (say a boolean against a number) are never equal.

use crate::config::ComparisonConfig;
use crate::dataset::{CellValue, Dataset, DatasetSide, Row};
use crate::diff::CellDiff;
use crate::matcher::CommonRow;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Normalized<'v> {
    Null,
    Text(&'v str),
    Number(f64),
    Boolean(bool),
    Date(NaiveDateTime),
}

pub(crate) fn normalize<'v>(value: &'v CellValue, config: &ComparisonConfig) -> Normalized<'v> {
    match value {
        CellValue::Null => Normalized::Null,
        CellValue::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Normalized::Null;
            }
            if config.coerce_numeric_text {
                if let Some(n) = parse_numeric_text(trimmed) {
                    return Normalized::Number(n);
                }
            }
            Normalized::Text(trimmed)
        }
        CellValue::Number(n) => Normalized::Number(*n),
        CellValue::Boolean(b) => Normalized::Boolean(*b),
        CellValue::Date(dt) => Normalized::Date(config.date_granularity.truncate(*dt)),
    }
}

/// Significant digits an `f64` always reproduces exactly.
const MAX_EXACT_DIGITS: usize = 15;

/// Accepts decimal and exponent notation; rejects `inf`/`nan` spellings, anything that
/// does not contain a digit, and mantissas too long to survive the conversion (long
/// identifiers such as account numbers stay text).
fn parse_numeric_text(s: &str) -> Option<f64> {
    if !s.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    if significant_digits(s) > MAX_EXACT_DIGITS {
        return None;
    }
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn significant_digits(s: &str) -> usize {
    let mantissa = s.split(['e', 'E']).next().unwrap_or(s);
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let frac_part = frac_part.trim_end_matches('0');
    let digits: String = int_part
        .chars()
        .chain(frac_part.chars())
        .filter(char::is_ascii_digit)
        .collect();
    digits.trim_start_matches('0').len()
}

/// Whether two cells are the same value under `config`.
pub fn values_equivalent(old: &CellValue, new: &CellValue, config: &ComparisonConfig) -> bool {
    match (normalize(old, config), normalize(new, config)) {
        (Normalized::Null, Normalized::Null) => true,
        (Normalized::Text(a), Normalized::Text(b)) => a == b,
        (Normalized::Number(a), Normalized::Number(b)) => config.numeric_tolerance.approx_eq(a, b),
        (Normalized::Boolean(a), Normalized::Boolean(b)) => a == b,
        (Normalized::Date(a), Normalized::Date(b)) => a == b,
        _ => false,
    }
}

/// A column present in both datasets that takes part in cell comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparedColumn {
    pub id: String,
    /// Original column index in the old dataset; orders cell diffs within a row.
    pub index: usize,
    pub old_position: usize,
    pub new_position: usize,
}

/// A column found in only one of the two datasets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaOnlyColumn {
    pub column: String,
    pub side: DatasetSide,
    pub index: usize,
}

/// Which columns are compared, which exist on one side only, and which ignore entries
/// matched nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnPlan {
    pub compared: Vec<ComparedColumn>,
    pub schema_only: Vec<SchemaOnlyColumn>,
    pub unmatched_ignores: Vec<String>,
}

pub fn plan_columns(old: &Dataset, new: &Dataset, config: &ComparisonConfig) -> ColumnPlan {
    let mut plan = ColumnPlan::default();

    let mut old_columns: Vec<(usize, &crate::dataset::Column)> =
        old.columns().iter().enumerate().collect();
    old_columns.sort_by_key(|(_, column)| column.index);

    for (old_position, column) in old_columns {
        let id = column.id();
        match new.column_position(&id) {
            Some(new_position) => {
                if config.is_key(&id) || config.is_ignored(&id) {
                    continue;
                }
                plan.compared.push(ComparedColumn {
                    id,
                    index: column.index,
                    old_position,
                    new_position,
                });
            }
            None => plan.schema_only.push(SchemaOnlyColumn {
                column: id,
                side: DatasetSide::Old,
                index: column.index,
            }),
        }
    }

    let mut new_only: Vec<SchemaOnlyColumn> = new
        .columns()
        .iter()
        .filter_map(|column| {
            let id = column.id();
            old.column_position(&id).is_none().then(|| SchemaOnlyColumn {
                column: id,
                side: DatasetSide::New,
                index: column.index,
            })
        })
        .collect();
    new_only.sort_by_key(|c| c.index);
    plan.schema_only.extend(new_only);

    plan.unmatched_ignores = config
        .ignore_columns
        .iter()
        .filter(|id| old.column_position(id).is_none() && new.column_position(id).is_none())
        .cloned()
        .collect();

    plan
}

/// Cell diffs between two rows, ordered by the old dataset's column index. An empty result
/// means the rows are unchanged.
pub fn compare_rows(
    old: &Row,
    new: &Row,
    plan: &ColumnPlan,
    config: &ComparisonConfig,
) -> Vec<CellDiff> {
    let mut diffs = Vec::new();
    for column in &plan.compared {
        let old_value = old.get(column.old_position).unwrap_or(&CellValue::Null);
        let new_value = new.get(column.new_position).unwrap_or(&CellValue::Null);
        if values_equivalent(old_value, new_value, config) {
            continue;
        }
        diffs.push(CellDiff {
            column: column.id.clone(),
            column_index: column.index,
            old: old_value.clone(),
            new: new_value.clone(),
        });
    }
    diffs
}

/// Below this many common keys the comparison stays on the calling thread.
pub(crate) const PARALLEL_MIN_ROWS: usize = 4096;

/// Compares every common key. The result is index-aligned with `common`, whatever the
/// worker scheduling.
pub fn compare_common_rows(
    common: &[CommonRow<'_, '_>],
    plan: &ColumnPlan,
    config: &ComparisonConfig,
) -> Vec<Vec<CellDiff>> {
    #[cfg(feature = "parallel")]
    {
        if common.len() >= PARALLEL_MIN_ROWS {
            use rayon::prelude::*;
            return common
                .par_iter()
                .map(|pair| compare_rows(pair.old.row, pair.new.row, plan, config))
                .collect();
        }
    }

    common
        .iter()
        .map(|pair| compare_rows(pair.old.row, pair.new.row, plan, config))
        .collect()
}
