use crate::dataset::CellValue;
use crate::diff::{DiffReport, RowDiff};
use serde::Serialize;

/// One modified cell flattened for tabular consumers: the row's key values, the column,
/// and the old and new values rendered as text (`None` for blank).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellRecord {
    pub key: Vec<String>,
    pub column: String,
    pub old: Option<String>,
    pub new: Option<String>,
}

pub fn serialize_diff_report(report: &DiffReport) -> serde_json::Result<String> {
    serde_json::to_string(report)
}

/// Flattens every modified cell of `report`, in report order.
pub fn report_to_cell_records(report: &DiffReport) -> Vec<CellRecord> {
    fn render_value(value: &CellValue) -> Option<String> {
        if value.is_blank() {
            None
        } else {
            Some(value.to_string())
        }
    }

    report
        .modified
        .iter()
        .filter_map(|row| match row {
            RowDiff::Modified { key, cells, .. } => Some((key.display_values(), cells)),
            _ => None,
        })
        .flat_map(|(key, cells)| {
            cells.iter().map(move |cell| CellRecord {
                key: key.clone(),
                column: cell.column.clone(),
                old: render_value(&cell.old),
                new: render_value(&cell.new),
            })
        })
        .collect()
}
