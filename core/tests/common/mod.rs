//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use table_diff::{
    CellValue, Column, ComparisonConfig, Dataset, DiffReport, Row, RowDiff, diff_datasets,
};

/// Single-row-header dataset; data rows get source indices `1..` as if the header sat on
/// row 0.
pub fn dataset(columns: &[&str], rows: Vec<Vec<CellValue>>) -> Dataset {
    let columns = columns
        .iter()
        .enumerate()
        .map(|(idx, name)| Column::named(name, idx))
        .collect();
    let rows = rows
        .into_iter()
        .enumerate()
        .map(|(idx, values)| Row::new(idx + 1, values))
        .collect();
    Dataset::new(columns, rows).expect("valid dataset")
}

pub fn keyed(key: &str) -> ComparisonConfig {
    ComparisonConfig::new([key])
}

pub fn diff(old: &Dataset, new: &Dataset, config: &ComparisonConfig) -> DiffReport {
    diff_datasets(old, new, config).expect("diff should succeed")
}

pub fn keys_of(rows: &[RowDiff]) -> Vec<String> {
    rows.iter().map(|row| row.key().to_string()).collect()
}

/// Modified rows as `(key, [changed columns])`.
pub fn modified_columns(report: &DiffReport) -> Vec<(String, Vec<String>)> {
    report
        .modified
        .iter()
        .map(|row| {
            (
                row.key().to_string(),
                row.cells().iter().map(|c| c.column.clone()).collect(),
            )
        })
        .collect()
}

/// Deterministic pseudo-random dataset with columns `id, name, qty, price, flag`.
///
/// `seed` varies the content; `id_stride` and `id_offset` shape which keys exist so two
/// generated datasets overlap partially.
pub fn generated(rows: usize, seed: u64, id_stride: u64, id_offset: u64) -> Dataset {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        state >> 33
    };

    let data = (0..rows as u64)
        .map(|i| {
            let id = i * id_stride + id_offset;
            vec![
                CellValue::Number(id as f64),
                CellValue::String(format!("item-{}", next() % 7)),
                CellValue::Number((next() % 5) as f64),
                CellValue::Number((next() % 300) as f64 / 4.0),
                CellValue::Boolean(next() % 2 == 0),
            ]
        })
        .collect();
    dataset(&["id", "name", "qty", "price", "flag"], data)
}
