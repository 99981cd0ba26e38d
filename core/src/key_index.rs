//! Key extraction and per-dataset key indexes.
//!
//! A row's key is the ordered list of its key-column values. Keys are matched on a
//! canonical form that uses the same normalization as cell comparison (trimmed text,
//! numeric text coerced when enabled, dates truncated to the configured granularity), with
//! numbers hashed by their exact bit pattern (`-0.0` and NaN folded). Numeric tolerance is
//! not applied to keys, so `1`, `1.0` and `"1"` share a key but `0.1 + 0.2` and `0.3` do not.

use crate::compare::{Normalized, normalize};
use crate::config::{ComparisonConfig, DuplicateKeyPolicy};
use crate::dataset::{CellValue, Dataset, DatasetSide, Row};
use crate::diff::DiffError;
use crate::hashing::normalize_float_for_hash;
use chrono::NaiveDateTime;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum KeyComponent {
    Text(String),
    Number(u64),
    Boolean(bool),
    Date(NaiveDateTime),
}

impl KeyComponent {
    /// `None` for blank values, which never form a valid key.
    fn from_cell(value: &CellValue, config: &ComparisonConfig) -> Option<KeyComponent> {
        match normalize(value, config) {
            Normalized::Null => None,
            Normalized::Text(s) => Some(KeyComponent::Text(s.to_string())),
            Normalized::Number(n) => Some(KeyComponent::Number(normalize_float_for_hash(n))),
            Normalized::Boolean(b) => Some(KeyComponent::Boolean(b)),
            Normalized::Date(dt) => Some(KeyComponent::Date(dt)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct CanonicalKey(Vec<KeyComponent>);

/// The key-column values of one row, as they appeared in the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyTuple {
    values: Vec<CellValue>,
}

impl KeyTuple {
    pub fn new(values: Vec<CellValue>) -> KeyTuple {
        KeyTuple { values }
    }

    pub fn values(&self) -> &[CellValue] {
        &self.values
    }

    /// Values rendered as text, in key-column order.
    pub fn display_values(&self) -> Vec<String> {
        self.values.iter().map(CellValue::to_string).collect()
    }
}

impl std::fmt::Display for KeyTuple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display_values().join(" | "))
    }
}

/// A non-fatal key problem. Rows are identified by their source row index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KeyIssue {
    /// A key component was blank; the row was left out of the comparison.
    InvalidKey {
        side: DatasetSide,
        row: usize,
        column: String,
    },
    /// The key was already indexed; `row` was left out and `canonical_row` is compared.
    DuplicateKey {
        side: DatasetSide,
        row: usize,
        canonical_row: usize,
        key: KeyTuple,
    },
}

impl KeyIssue {
    pub fn side(&self) -> DatasetSide {
        match self {
            KeyIssue::InvalidKey { side, .. } | KeyIssue::DuplicateKey { side, .. } => *side,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndexedRow<'a> {
    pub key: KeyTuple,
    pub(crate) canonical: CanonicalKey,
    pub row: &'a Row,
}

/// Key → row mapping for one dataset. At most one row per key; entries keep the order in
/// which each key was first seen.
#[derive(Debug, Clone)]
pub struct KeyIndex<'a> {
    side: DatasetSide,
    config: &'a ComparisonConfig,
    entries: Vec<IndexedRow<'a>>,
    lookup: FxHashMap<CanonicalKey, usize>,
    issues: Vec<KeyIssue>,
    invalid_key_count: usize,
    duplicate_key_count: usize,
}

impl<'a> KeyIndex<'a> {
    pub fn side(&self) -> DatasetSide {
        self.side
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Indexed rows in first-seen key order.
    pub fn iter(&self) -> impl Iterator<Item = &IndexedRow<'a>> {
        self.entries.iter()
    }

    pub fn get(&self, key: &KeyTuple) -> Option<&'a Row> {
        let canonical = canonicalize(key.values(), self.config)?;
        self.get_canonical(&canonical).map(|entry| entry.row)
    }

    pub fn contains(&self, key: &KeyTuple) -> bool {
        self.get(key).is_some()
    }

    pub(crate) fn get_canonical(&self, key: &CanonicalKey) -> Option<&IndexedRow<'a>> {
        self.lookup.get(key).map(|&slot| &self.entries[slot])
    }

    pub fn issues(&self) -> &[KeyIssue] {
        &self.issues
    }

    pub fn invalid_key_count(&self) -> usize {
        self.invalid_key_count
    }

    pub fn duplicate_key_count(&self) -> usize {
        self.duplicate_key_count
    }
}

fn canonicalize(values: &[CellValue], config: &ComparisonConfig) -> Option<CanonicalKey> {
    values
        .iter()
        .map(|value| KeyComponent::from_cell(value, config))
        .collect::<Option<Vec<_>>>()
        .map(CanonicalKey)
}

/// Positions of the configured key columns in `dataset`, in key order.
pub(crate) fn key_positions(
    dataset: &Dataset,
    side: DatasetSide,
    config: &ComparisonConfig,
) -> Result<Vec<usize>, DiffError> {
    config
        .key_columns
        .iter()
        .map(|column| {
            dataset
                .column_position(column)
                .ok_or_else(|| DiffError::MissingKeyColumn {
                    column: column.clone(),
                    side,
                    available: dataset.column_ids(),
                })
        })
        .collect()
}

/// Builds the key index of `dataset`.
///
/// Fails with [`DiffError::MissingKeyColumn`] before looking at any row when a key column
/// is absent, and with [`DiffError::DuplicateKey`] on a repeated key under
/// [`DuplicateKeyPolicy::Error`]. Blank key components and (under the other policies)
/// repeated keys are recorded as [`KeyIssue`]s.
pub fn build_key_index<'a>(
    dataset: &'a Dataset,
    side: DatasetSide,
    config: &'a ComparisonConfig,
) -> Result<KeyIndex<'a>, DiffError> {
    let positions = key_positions(dataset, side, config)?;

    let mut index = KeyIndex {
        side,
        config,
        entries: Vec::with_capacity(dataset.len()),
        lookup: FxHashMap::default(),
        issues: Vec::new(),
        invalid_key_count: 0,
        duplicate_key_count: 0,
    };

    for row in dataset.rows() {
        let values: Vec<CellValue> = positions
            .iter()
            .map(|&pos| row.get(pos).cloned().unwrap_or(CellValue::Null))
            .collect();

        let mut components = Vec::with_capacity(values.len());
        let mut blank_column = None;
        for (value, column) in values.iter().zip(&config.key_columns) {
            match KeyComponent::from_cell(value, config) {
                Some(component) => components.push(component),
                None => {
                    blank_column = Some(column);
                    break;
                }
            }
        }
        if let Some(column) = blank_column {
            index.invalid_key_count += 1;
            index.issues.push(KeyIssue::InvalidKey {
                side,
                row: row.source_index,
                column: column.clone(),
            });
            continue;
        }

        let entry = IndexedRow {
            key: KeyTuple::new(values),
            canonical: CanonicalKey(components),
            row,
        };

        let Some(&slot) = index.lookup.get(&entry.canonical) else {
            index.lookup.insert(entry.canonical.clone(), index.entries.len());
            index.entries.push(entry);
            continue;
        };

        let canonical_row = index.entries[slot].row.source_index;
        match config.duplicate_key_policy {
            DuplicateKeyPolicy::Error => {
                return Err(DiffError::DuplicateKey {
                    side,
                    key: entry.key.to_string(),
                    first_row: canonical_row,
                    duplicate_row: row.source_index,
                });
            }
            DuplicateKeyPolicy::FirstWins => {
                index.duplicate_key_count += 1;
                index.issues.push(KeyIssue::DuplicateKey {
                    side,
                    row: row.source_index,
                    canonical_row,
                    key: entry.key,
                });
            }
            DuplicateKeyPolicy::LastWins => {
                let displaced = std::mem::replace(&mut index.entries[slot], entry);
                index.duplicate_key_count += 1;
                index.issues.push(KeyIssue::DuplicateKey {
                    side,
                    row: displaced.row.source_index,
                    canonical_row: row.source_index,
                    key: displaced.key,
                });
            }
        }
    }

    Ok(index)
}
