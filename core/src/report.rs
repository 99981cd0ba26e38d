//! Report assembly: folds the matcher and comparator outputs into one [`DiffReport`].

use crate::compare::ColumnPlan;
use crate::config::ComparisonConfig;
use crate::dataset::Dataset;
use crate::diff::{CellDiff, DiffReport, DiffSummary, RowDiff};
use crate::key_index::KeyIndex;
use crate::matcher::RowMatch;

pub(crate) struct ReportInputs<'r, 'i, 'a> {
    pub old: &'r Dataset,
    pub new: &'r Dataset,
    pub old_index: &'r KeyIndex<'a>,
    pub new_index: &'r KeyIndex<'a>,
    pub matched: RowMatch<'i, 'a>,
    /// Index-aligned with `matched.common`.
    pub cell_diffs: Vec<Vec<CellDiff>>,
    pub plan: ColumnPlan,
    pub config: &'r ComparisonConfig,
}

pub(crate) fn assemble_report(inputs: ReportInputs<'_, '_, '_>) -> DiffReport {
    let ReportInputs {
        old,
        new,
        old_index,
        new_index,
        matched,
        cell_diffs,
        plan,
        config,
    } = inputs;

    let added: Vec<RowDiff> = matched
        .added
        .iter()
        .map(|entry| RowDiff::Added {
            key: entry.key.clone(),
            row: entry.row.clone(),
        })
        .collect();

    let removed: Vec<RowDiff> = matched
        .removed
        .iter()
        .map(|entry| RowDiff::Removed {
            key: entry.key.clone(),
            row: entry.row.clone(),
        })
        .collect();

    let mut modified = Vec::new();
    let mut unchanged = 0usize;
    let mut modified_cells = 0usize;
    for (pair, cells) in matched.common.iter().zip(cell_diffs) {
        if cells.is_empty() {
            unchanged += 1;
            continue;
        }
        modified_cells += cells.len();
        modified.push(RowDiff::Modified {
            key: pair.old.key.clone(),
            old_row: pair.old.row.source_index,
            new_row: pair.new.row.source_index,
            cells,
        });
    }

    let summary = DiffSummary {
        old_rows: old.len(),
        new_rows: new.len(),
        added: added.len(),
        removed: removed.len(),
        modified: modified.len(),
        unchanged,
        modified_cells,
        invalid_key_count: old_index.invalid_key_count() + new_index.invalid_key_count(),
        duplicate_key_count: old_index.duplicate_key_count() + new_index.duplicate_key_count(),
    };

    let warnings = collect_warnings(&plan, old_index, new_index);
    let key_issues = old_index
        .issues()
        .iter()
        .chain(new_index.issues())
        .cloned()
        .collect();

    DiffReport {
        version: DiffReport::SCHEMA_VERSION.to_string(),
        summary,
        old_columns: old.column_ids(),
        new_columns: new.column_ids(),
        schema_only_columns: plan.schema_only,
        added,
        removed,
        modified,
        key_issues,
        warnings,
        config: config.clone(),
    }
}

fn collect_warnings(
    plan: &ColumnPlan,
    old_index: &KeyIndex<'_>,
    new_index: &KeyIndex<'_>,
) -> Vec<String> {
    let mut warnings = Vec::new();

    for column in &plan.schema_only {
        warnings.push(format!(
            "column '{}' exists only in the {} dataset and was not compared",
            column.column, column.side
        ));
    }

    for column in &plan.unmatched_ignores {
        warnings.push(format!("ignored column '{column}' does not exist in either dataset"));
    }

    for index in [old_index, new_index] {
        if index.invalid_key_count() > 0 {
            warnings.push(format!(
                "{} row(s) in the {} dataset have a blank key and were skipped",
                index.invalid_key_count(),
                index.side()
            ));
        }
        if index.duplicate_key_count() > 0 {
            warnings.push(format!(
                "{} row(s) in the {} dataset share a key with another row and were skipped",
                index.duplicate_key_count(),
                index.side()
            ));
        }
    }

    warnings
}
