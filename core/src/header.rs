//! Header resolution: flattening an N-row (possibly merged) header block into one stable
//! leaf identifier per column.
//!
//! Spreadsheet readers only report a merged cell's value in its top-left corner, so the
//! block is merge-filled before flattening:
//!
//! 1. An empty cell inherits the nearest non-empty value above it in the same column.
//! 2. If nothing above is non-empty, it inherits the nearest non-empty value to its left in
//!    the same header row.
//!
//! Rows are filled top to bottom and cells left to right, so values propagated earlier
//! take part in later lookups. The resolved [`HeaderPath`] of a column is printed as its
//! segments joined with `/`. When two columns resolve to the same identifier, every later
//! occurrence gets its 0-based column index appended as an extra segment, repeatedly until
//! the identifier is unique.

use crate::error_codes;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const HEADER_PATH_SEPARATOR: &str = "/";

/// Ordered header values of one column, one per header row, after merge-fill.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeaderPath {
    segments: Vec<String>,
}

impl HeaderPath {
    pub fn new<I, S>(segments: I) -> HeaderPath
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        HeaderPath {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The slash-joined identifier used to address this column.
    pub fn leaf_id(&self) -> String {
        self.segments.join(HEADER_PATH_SEPARATOR)
    }

    pub fn is_blank(&self) -> bool {
        self.segments.iter().all(|s| s.is_empty())
    }
}

impl std::fmt::Display for HeaderPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.leaf_id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum HeaderError {
    #[error("[TDIFF_HDR_001] at least one header row is required. Suggestion: pass a header row count of 1 or more.")]
    NoHeaderRows,

    #[error(
        "[TDIFF_HDR_002] header needs {requested} row(s) but only {available} are available. Suggestion: check the header row count and start row."
    )]
    RowsUnavailable { requested: usize, available: usize },

    #[error(
        "[TDIFF_HDR_003] column {column} has no header text in any header row. Suggestion: label the column or reduce the header row count."
    )]
    EmptyColumn { column: usize },
}

impl HeaderError {
    pub fn code(&self) -> &'static str {
        match self {
            HeaderError::NoHeaderRows => error_codes::HEADER_NO_ROWS,
            HeaderError::RowsUnavailable { .. } => error_codes::HEADER_ROWS_UNAVAILABLE,
            HeaderError::EmptyColumn { .. } => error_codes::HEADER_EMPTY_COLUMN,
        }
    }
}

/// Resolves the first `header_rows` rows of `sheet_rows` into one [`HeaderPath`] per column.
///
/// The column count is the widest header row; shorter rows are treated as padded with empty
/// cells. Cell text is trimmed before filling.
pub fn resolve_headers(
    sheet_rows: &[Vec<String>],
    header_rows: usize,
) -> Result<Vec<HeaderPath>, HeaderError> {
    if header_rows == 0 {
        return Err(HeaderError::NoHeaderRows);
    }
    if header_rows > sheet_rows.len() {
        return Err(HeaderError::RowsUnavailable {
            requested: header_rows,
            available: sheet_rows.len(),
        });
    }

    let block = &sheet_rows[..header_rows];
    let width = block.iter().map(Vec::len).max().unwrap_or(0);

    let mut filled: Vec<Vec<String>> = block
        .iter()
        .map(|row| {
            (0..width)
                .map(|col| row.get(col).map(|cell| cell.trim().to_string()).unwrap_or_default())
                .collect()
        })
        .collect();

    for r in 0..header_rows {
        for c in 0..width {
            if !filled[r][c].is_empty() {
                continue;
            }
            let inherited = (0..r)
                .rev()
                .map(|above| &filled[above][c])
                .find(|v| !v.is_empty())
                .or_else(|| (0..c).rev().map(|left| &filled[r][left]).find(|v| !v.is_empty()))
                .cloned();
            if let Some(value) = inherited {
                filled[r][c] = value;
            }
        }
    }

    let mut paths = Vec::with_capacity(width);
    for c in 0..width {
        let path = HeaderPath::new(filled.iter().map(|row| row[c].clone()));
        if path.is_blank() {
            return Err(HeaderError::EmptyColumn { column: c });
        }
        paths.push(path);
    }

    disambiguate(&mut paths);
    Ok(paths)
}

fn disambiguate(paths: &mut [HeaderPath]) {
    let mut taken: FxHashSet<String> = FxHashSet::default();
    for (idx, path) in paths.iter_mut().enumerate() {
        // a suffixed id can collide with a literal header such as "a/2"
        while taken.contains(&path.leaf_id()) {
            path.segments.push(idx.to_string());
        }
        taken.insert(path.leaf_id());
    }
}
