//! Tabular data model consumed by the diff pipeline.
//!
//! - [`CellValue`]: explicit tagged cell content (never an untyped value)
//! - [`Column`]: a resolved header path plus its original column index
//! - [`Row`]: one data row, positionally aligned with its dataset's columns
//! - [`Dataset`]: immutable columns + rows produced by an external loader

use crate::error_codes;
use crate::header::{HeaderError, HeaderPath, resolve_headers};
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    String(String),
    Number(f64),
    Boolean(bool),
    Date(NaiveDateTime),
    Null,
}

impl CellValue {
    /// `Null` or a string that is empty after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::String(s) => f.write_str(s),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Boolean(b) => write!(f, "{b}"),
            CellValue::Date(dt) if dt.time().num_seconds_from_midnight() == 0
                && dt.time().nanosecond() == 0 =>
            {
                write!(f, "{}", dt.format("%Y-%m-%d"))
            }
            CellValue::Date(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            CellValue::Null => Ok(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::String(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::String(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Boolean(value)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(value: NaiveDateTime) -> Self {
        CellValue::Date(value)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(value: NaiveDate) -> Self {
        value
            .and_hms_opt(0, 0, 0)
            .map_or(CellValue::Null, CellValue::Date)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Null)
    }
}

/// Which side of a comparison a dataset, row or column belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetSide {
    Old,
    New,
}

impl std::fmt::Display for DatasetSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetSide::Old => f.write_str("old"),
            DatasetSide::New => f.write_str("new"),
        }
    }
}

/// A column identified by its header path; `index` is its position in the source sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub path: HeaderPath,
    pub index: usize,
}

impl Column {
    pub fn new(path: HeaderPath, index: usize) -> Column {
        Column { path, index }
    }

    /// Single-row header shorthand.
    pub fn named(name: &str, index: usize) -> Column {
        Column::new(HeaderPath::new([name]), index)
    }

    pub fn id(&self) -> String {
        self.path.leaf_id()
    }
}

/// One data row. `values[i]` belongs to the dataset's `columns()[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// 0-based row position in the source sheet.
    pub source_index: usize,
    pub values: Vec<CellValue>,
}

impl Row {
    pub fn new(source_index: usize, values: Vec<CellValue>) -> Row {
        Row {
            source_index,
            values,
        }
    }

    pub fn get(&self, position: usize) -> Option<&CellValue> {
        self.values.get(position)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum DatasetError {
    #[error(
        "[TDIFF_DATA_001] row {row} has {found} value(s) but the dataset has {expected} column(s). Suggestion: pad or trim rows to the header width."
    )]
    RowWidthMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("[TDIFF_DATA_002] column '{id}' appears more than once. Suggestion: give every column a distinct header.")]
    DuplicateColumn { id: String },

    #[error(transparent)]
    Header(#[from] HeaderError),
}

impl DatasetError {
    pub fn code(&self) -> &'static str {
        match self {
            DatasetError::RowWidthMismatch { .. } => error_codes::DATASET_ROW_WIDTH,
            DatasetError::DuplicateColumn { .. } => error_codes::DATASET_DUPLICATE_COLUMN,
            DatasetError::Header(e) => e.code(),
        }
    }
}

/// An immutable table: every row shares the same column list.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    rows: Vec<Row>,
    positions: FxHashMap<String, usize>,
}

impl Dataset {
    pub fn new(columns: Vec<Column>, rows: Vec<Row>) -> Result<Dataset, DatasetError> {
        let mut positions = FxHashMap::default();
        for (pos, column) in columns.iter().enumerate() {
            let id = column.id();
            if positions.insert(id.clone(), pos).is_some() {
                return Err(DatasetError::DuplicateColumn { id });
            }
        }

        for row in &rows {
            if row.values.len() != columns.len() {
                return Err(DatasetError::RowWidthMismatch {
                    row: row.source_index,
                    expected: columns.len(),
                    found: row.values.len(),
                });
            }
        }

        Ok(Dataset {
            columns,
            rows,
            positions,
        })
    }

    /// Builds a dataset from a raw sheet whose header block starts at `header_start` and
    /// spans `header_rows` rows. Rows below the header become data rows; rows that are blank
    /// in every cell are skipped. Short rows are padded with `Null`; cells beyond the header
    /// width are tolerated only when blank.
    pub fn from_sheet(
        sheet_rows: &[Vec<CellValue>],
        header_start: usize,
        header_rows: usize,
    ) -> Result<Dataset, DatasetError> {
        let body = sheet_rows.get(header_start..).unwrap_or(&[]);
        let header_text: Vec<Vec<String>> = body
            .iter()
            .take(header_rows)
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect();
        let paths = resolve_headers(&header_text, header_rows)?;
        let width = paths.len();

        let columns = paths
            .into_iter()
            .enumerate()
            .map(|(index, path)| Column::new(path, index))
            .collect();

        let first_data_row = header_start + header_rows;
        let mut rows = Vec::with_capacity(sheet_rows.len().saturating_sub(first_data_row));
        for (offset, raw) in body.iter().enumerate().skip(header_rows) {
            if raw.iter().all(CellValue::is_blank) {
                continue;
            }
            let source_index = header_start + offset;
            if raw.len() > width && !raw[width..].iter().all(CellValue::is_blank) {
                return Err(DatasetError::RowWidthMismatch {
                    row: source_index,
                    expected: width,
                    found: raw.len(),
                });
            }
            let mut values: Vec<CellValue> = raw.iter().take(width).cloned().collect();
            values.resize(width, CellValue::Null);
            rows.push(Row::new(source_index, values));
        }

        Dataset::new(columns, rows)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the column with leaf identifier `id` (exact match).
    pub fn column_position(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    pub fn column_ids(&self) -> Vec<String> {
        self.columns.iter().map(Column::id).collect()
    }
}
