use crate::commands::diff::{RunInfo, Verbosity};
use anyhow::Result;
use std::io::Write;
use table_diff::{CellValue, DiffReport, KeyIssue, Row, RowDiff};

/// Renders the report in four sections: overview, added rows, removed rows and modified
/// cells. Quiet mode prints the overview only.
pub fn write_text_report<W: Write>(
    w: &mut W,
    report: &DiffReport,
    info: &RunInfo<'_>,
    verbosity: Verbosity,
) -> Result<()> {
    write_overview(w, report, info)?;
    if verbosity == Verbosity::Quiet {
        return Ok(());
    }

    writeln!(w)?;
    writeln!(w, "Added rows ({}):", report.added.len())?;
    for row in &report.added {
        if let RowDiff::Added { row, .. } = row {
            writeln!(w, "  {}", render_row(row, &report.new_columns))?;
        }
    }

    writeln!(w)?;
    writeln!(w, "Removed rows ({}):", report.removed.len())?;
    for row in &report.removed {
        if let RowDiff::Removed { row, .. } = row {
            writeln!(w, "  {}", render_row(row, &report.old_columns))?;
        }
    }

    writeln!(w)?;
    writeln!(w, "Modified cells ({}):", report.summary.modified_cells)?;
    for row in &report.modified {
        if let RowDiff::Modified {
            key,
            old_row,
            new_row,
            cells,
        } = row
        {
            writeln!(
                w,
                "  Key {} (old row {}, new row {}):",
                key,
                old_row + 1,
                new_row + 1
            )?;
            for cell in cells {
                writeln!(
                    w,
                    "    {}: {} -> {}",
                    cell.column,
                    render_value(&cell.old),
                    render_value(&cell.new)
                )?;
            }
        }
    }

    if !report.warnings.is_empty() {
        writeln!(w)?;
        writeln!(w, "Warnings:")?;
        for warning in &report.warnings {
            writeln!(w, "  {}", warning)?;
        }
    }

    if verbosity == Verbosity::Verbose && !report.key_issues.is_empty() {
        writeln!(w)?;
        writeln!(w, "Key issues ({}):", report.key_issues.len())?;
        for issue in &report.key_issues {
            writeln!(w, "  {}", render_issue(issue))?;
        }
    }

    Ok(())
}

fn write_overview<W: Write>(w: &mut W, report: &DiffReport, info: &RunInfo<'_>) -> Result<()> {
    let summary = &report.summary;
    writeln!(w, "Overview:")?;
    writeln!(w, "  Compared at: {}", info.compared_at)?;
    writeln!(
        w,
        "  Old file: {} ({} rows)",
        info.old_path.display(),
        summary.old_rows
    )?;
    writeln!(
        w,
        "  New file: {} ({} rows)",
        info.new_path.display(),
        summary.new_rows
    )?;
    writeln!(w, "  Key columns: {}", report.key_columns().join(", "))?;
    if !report.ignored_columns().is_empty() {
        writeln!(w, "  Ignored columns: {}", report.ignored_columns().join(", "))?;
    }
    if report.has_differences() {
        writeln!(w, "  Result: differences found")?;
    } else {
        writeln!(w, "  Result: no differences")?;
    }
    writeln!(w, "  Added rows: {}", summary.added)?;
    writeln!(w, "  Removed rows: {}", summary.removed)?;
    writeln!(
        w,
        "  Modified rows: {} ({} cells)",
        summary.modified, summary.modified_cells
    )?;
    writeln!(w, "  Unchanged rows: {}", summary.unchanged)?;
    if summary.invalid_key_count > 0 {
        writeln!(w, "  Rows with blank keys: {}", summary.invalid_key_count)?;
    }
    if summary.duplicate_key_count > 0 {
        writeln!(w, "  Rows with duplicate keys: {}", summary.duplicate_key_count)?;
    }
    Ok(())
}

fn render_row(row: &Row, columns: &[String]) -> String {
    let cells: Vec<String> = columns
        .iter()
        .zip(&row.values)
        .map(|(column, value)| format!("{}={}", column, render_value(value)))
        .collect();
    format!("Row {}: {}", row.source_index + 1, cells.join(", "))
}

fn render_value(value: &CellValue) -> String {
    if value.is_blank() {
        "(blank)".to_string()
    } else {
        value.to_string()
    }
}

fn render_issue(issue: &KeyIssue) -> String {
    match issue {
        KeyIssue::InvalidKey { side, row, column } => {
            format!("{side} row {}: blank key column '{column}'", row + 1)
        }
        KeyIssue::DuplicateKey {
            side,
            row,
            canonical_row,
            key,
        } => format!(
            "{side} row {}: key {key} already used by row {}",
            row + 1,
            canonical_row + 1
        ),
    }
}
