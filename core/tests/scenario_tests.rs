mod common;

use common::{dataset, diff, keyed, keys_of, modified_columns};
use table_diff::{
    CellValue, ComparisonConfig, Dataset, DatasetSide, DiffError, DuplicateKeyPolicy, KeyIssue,
    RowDiff, diff_datasets, error_codes,
};

fn sheet(rows: &[&[&str]]) -> Vec<Vec<CellValue>> {
    rows.iter()
        .map(|row| {
            row.iter()
                .map(|cell| {
                    if cell.is_empty() {
                        CellValue::Null
                    } else {
                        CellValue::from(*cell)
                    }
                })
                .collect()
        })
        .collect()
}

#[test]
fn added_row_and_modified_value() {
    let old = dataset(
        &["id", "name", "val"],
        vec![vec![1i64.into(), "A".into(), 10i64.into()]],
    );
    let new = dataset(
        &["id", "name", "val"],
        vec![
            vec![1i64.into(), "A".into(), 20i64.into()],
            vec![2i64.into(), "B".into(), 5i64.into()],
        ],
    );
    let report = diff(&old, &new, &keyed("id"));

    assert_eq!(keys_of(&report.added), vec!["2"]);
    assert!(report.removed.is_empty());
    assert_eq!(report.modified.len(), 1);

    match &report.modified[0] {
        RowDiff::Modified {
            key,
            old_row,
            new_row,
            cells,
        } => {
            assert_eq!(key.values(), &[CellValue::Number(1.0)]);
            assert_eq!((*old_row, *new_row), (1, 1));
            assert_eq!(cells.len(), 1);
            assert_eq!(cells[0].column, "val");
            assert_eq!(cells[0].old, CellValue::Number(10.0));
            assert_eq!(cells[0].new, CellValue::Number(20.0));
        }
        other => panic!("expected modified row, got {other:?}"),
    }

    match &report.added[0] {
        RowDiff::Added { row, .. } => {
            assert_eq!(row.values[1], CellValue::from("B"));
        }
        other => panic!("expected added row, got {other:?}"),
    }

    let summary = report.summary;
    assert_eq!(summary.old_rows, 1);
    assert_eq!(summary.new_rows, 2);
    assert_eq!(summary.added, 1);
    assert_eq!(summary.modified, 1);
    assert_eq!(summary.unchanged, 0);
    assert_eq!(summary.modified_cells, 1);
    assert!(report.has_differences());
}

#[test]
fn duplicate_old_key_uses_first_row() {
    let old = dataset(
        &["id", "val"],
        vec![
            vec![1i64.into(), 10i64.into()],
            vec![1i64.into(), 99i64.into()],
        ],
    );
    let new = dataset(&["id", "val"], vec![vec![1i64.into(), 10i64.into()]]);
    let report = diff(&old, &new, &keyed("id"));

    assert_eq!(report.summary.duplicate_key_count, 1);
    assert_eq!(report.summary.unchanged, 1);
    assert!(report.modified.is_empty());
    assert!(!report.has_differences());
    assert!(matches!(
        report.key_issues[0],
        KeyIssue::DuplicateKey {
            side: DatasetSide::Old,
            row: 2,
            canonical_row: 1,
            ..
        }
    ));
}

#[test]
fn duplicate_old_key_last_wins_compares_latest_row() {
    let old = dataset(
        &["id", "val"],
        vec![
            vec![1i64.into(), 10i64.into()],
            vec![1i64.into(), 99i64.into()],
        ],
    );
    let new = dataset(&["id", "val"], vec![vec![1i64.into(), 10i64.into()]]);
    let config = ComparisonConfig {
        duplicate_key_policy: DuplicateKeyPolicy::LastWins,
        ..keyed("id")
    };
    let report = diff(&old, &new, &config);

    assert_eq!(report.summary.duplicate_key_count, 1);
    assert_eq!(modified_columns(&report), vec![("1".to_string(), vec!["val".to_string()])]);
}

#[test]
fn duplicate_key_under_error_policy_aborts() {
    let old = dataset(&["id"], vec![vec![1i64.into()], vec![1i64.into()]]);
    let new = dataset(&["id"], Vec::new());
    let config = ComparisonConfig {
        duplicate_key_policy: DuplicateKeyPolicy::Error,
        ..keyed("id")
    };
    let err = diff_datasets(&old, &new, &config).expect_err("duplicate key");
    assert_eq!(err.code(), error_codes::DIFF_DUPLICATE_KEY);
}

#[test]
fn merged_headers_flatten_to_leaf_identifiers() {
    let old_sheet = sheet(&[
        &["Region", "Sales", "Sales"],
        &["", "Q1", "Q2"],
        &["North", "10", "20"],
        &["South", "5", "6"],
    ]);
    let new_sheet = sheet(&[
        &["Region", "Sales", ""],
        &["", "Q1", "Q2"],
        &["North", "10", "21"],
        &["South", "5", "6"],
    ]);
    let old = Dataset::from_sheet(&old_sheet, 0, 2).expect("old");
    let new = Dataset::from_sheet(&new_sheet, 0, 2).expect("new");
    assert_eq!(old.column_ids(), vec!["Region/Region", "Sales/Q1", "Sales/Q2"]);
    assert_eq!(new.column_ids(), old.column_ids());

    let report = diff(&old, &new, &keyed("Region/Region"));
    assert_eq!(
        modified_columns(&report),
        vec![("North".to_string(), vec!["Sales/Q2".to_string()])]
    );
    match &report.modified[0] {
        RowDiff::Modified { old_row, .. } => assert_eq!(*old_row, 2),
        other => panic!("expected modified row, got {other:?}"),
    }
}

#[test]
fn removed_rows_follow_old_order_and_added_follow_new_order() {
    let old = dataset(
        &["id", "v"],
        vec![
            vec!["c".into(), 1i64.into()],
            vec!["a".into(), 1i64.into()],
            vec!["x".into(), 1i64.into()],
            vec!["b".into(), 1i64.into()],
        ],
    );
    let new = dataset(
        &["id", "v"],
        vec![
            vec!["z".into(), 1i64.into()],
            vec!["x".into(), 2i64.into()],
            vec!["y".into(), 1i64.into()],
        ],
    );
    let report = diff(&old, &new, &keyed("id"));
    assert_eq!(keys_of(&report.removed), vec!["c", "a", "b"]);
    assert_eq!(keys_of(&report.added), vec!["z", "y"]);
    assert_eq!(keys_of(&report.modified), vec!["x"]);
}

#[test]
fn schema_only_columns_are_reported_not_compared() {
    let old = dataset(
        &["id", "legacy", "val"],
        vec![vec![1i64.into(), "gone".into(), 1i64.into()]],
    );
    let new = dataset(
        &["id", "val", "fresh"],
        vec![vec![1i64.into(), 1i64.into(), "new".into()]],
    );
    let report = diff(&old, &new, &keyed("id"));

    assert!(report.modified.is_empty());
    assert_eq!(report.summary.unchanged, 1);
    let schema_only: Vec<(&str, DatasetSide)> = report
        .schema_only_columns
        .iter()
        .map(|c| (c.column.as_str(), c.side))
        .collect();
    assert_eq!(
        schema_only,
        vec![("legacy", DatasetSide::Old), ("fresh", DatasetSide::New)]
    );
    assert_eq!(report.warnings.len(), 2);
}

#[test]
fn blank_keys_are_counted_on_both_sides() {
    let old = dataset(
        &["id", "val"],
        vec![
            vec![CellValue::Null, 1i64.into()],
            vec![1i64.into(), 1i64.into()],
        ],
    );
    let new = dataset(
        &["id", "val"],
        vec![
            vec![1i64.into(), 1i64.into()],
            vec!["   ".into(), 3i64.into()],
        ],
    );
    let report = diff(&old, &new, &keyed("id"));
    assert_eq!(report.summary.invalid_key_count, 2);
    assert_eq!(report.summary.unchanged, 1);
    assert!(!report.has_differences());
    assert_eq!(report.key_issues.len(), 2);
    assert_eq!(report.key_issues[1].side(), DatasetSide::New);
}

#[test]
fn missing_key_column_names_column_and_side() {
    let old = dataset(&["id", "val"], Vec::new());
    let new = dataset(&["ID", "val"], Vec::new());
    let err = diff_datasets(&old, &new, &keyed("id")).expect_err("key column missing");
    assert_eq!(err.code(), error_codes::DIFF_MISSING_KEY_COLUMN);
    let message = err.to_string();
    assert!(message.contains("'id'"), "message: {message}");
    assert!(message.contains("new dataset"), "message: {message}");
    assert!(matches!(err, DiffError::MissingKeyColumn { .. }));
}

#[test]
fn composite_key_matches_on_all_components() {
    let old = dataset(
        &["region", "sku", "qty"],
        vec![
            vec!["north".into(), "A".into(), 1i64.into()],
            vec!["south".into(), "A".into(), 2i64.into()],
        ],
    );
    let new = dataset(
        &["sku", "region", "qty"],
        vec![
            vec!["A".into(), "south".into(), 3i64.into()],
            vec!["A".into(), "east".into(), 1i64.into()],
        ],
    );
    let config = ComparisonConfig::new(["region", "sku"]);
    let report = diff(&old, &new, &config);
    assert_eq!(keys_of(&report.removed), vec!["north | A"]);
    assert_eq!(keys_of(&report.added), vec!["east | A"]);
    assert_eq!(
        modified_columns(&report),
        vec![("south | A".to_string(), vec!["qty".to_string()])]
    );
}

#[test]
fn report_serializes_with_tagged_rows() {
    let old = dataset(&["id", "val"], vec![vec![1i64.into(), 10i64.into()]]);
    let new = dataset(&["id", "val"], vec![vec![1i64.into(), 20i64.into()]]);
    let report = diff(&old, &new, &keyed("id"));

    let json = table_diff::serialize_diff_report(&report).expect("serialize");
    let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
    assert_eq!(value["version"], "1");
    assert_eq!(value["summary"]["modified"], 1);
    assert_eq!(value["modified"][0]["kind"], "modified");
    assert_eq!(value["modified"][0]["cells"][0]["column"], "val");
    assert_eq!(value["modified"][0]["cells"][0]["new"]["type"], "number");
    assert_eq!(value["config"]["key_columns"][0], "id");

    let records = table_diff::report_to_cell_records(&report);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].key, vec!["1"]);
    assert_eq!(records[0].old.as_deref(), Some("10"));
    assert_eq!(records[0].new.as_deref(), Some("20"));

    let back: table_diff::DiffReport = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, report);
}
