use anyhow::{Context, Result, bail};
use calamine::{Data, Reader, open_workbook_auto};
use chrono::{NaiveDate, NaiveDateTime};
use std::path::Path;
use table_diff::CellValue;

/// A raw sheet: every row from the top of the sheet, cells from column A.
pub struct LoadedSheet {
    pub name: String,
    pub rows: Vec<Vec<CellValue>>,
}

pub fn load_sheet(path: &Path, sheet: Option<&str>) -> Result<LoadedSheet> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => {
            if let Some(name) = sheet {
                log::warn!("ignoring sheet '{name}' for csv input {}", path.display());
            }
            load_csv(path)
        }
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => load_workbook_sheet(path, sheet),
        other => bail!(
            "unsupported file type '{other}' for {}. Supported: csv, xlsx, xlsm, xlsb, xls, ods",
            path.display()
        ),
    }
}

fn load_csv(path: &Path) -> Result<LoadedSheet> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to open csv: {}", path.display()))?;

    let mut rows = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record = record
            .with_context(|| format!("failed to parse csv record {} in {}", row_idx + 1, path.display()))?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        CellValue::Null
                    } else {
                        CellValue::String(field.to_string())
                    }
                })
                .collect(),
        );
    }

    let name = path
        .file_stem()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .unwrap_or("csv")
        .to_string();
    Ok(LoadedSheet { name, rows })
}

fn load_workbook_sheet(path: &Path, sheet: Option<&str>) -> Result<LoadedSheet> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("failed to open workbook: {}", path.display()))?;

    let names = workbook.sheet_names().to_vec();
    let name = match sheet {
        Some(requested) => {
            if !names.iter().any(|n| n == requested) {
                bail!(
                    "sheet '{requested}' not found in {}. Available sheets: {}",
                    path.display(),
                    names.join(", ")
                );
            }
            requested.to_string()
        }
        None => match names.first() {
            Some(first) => first.clone(),
            None => bail!("workbook has no sheets: {}", path.display()),
        },
    };

    let range = workbook
        .worksheet_range(&name)
        .with_context(|| format!("failed to read sheet: {name}"))?;

    // Ranges start at the first used cell; pad so row/column positions match the sheet.
    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let mut rows: Vec<Vec<CellValue>> = (0..start_row).map(|_| Vec::new()).collect();
    for raw in range.rows() {
        let mut row = vec![CellValue::Null; start_col as usize];
        row.extend(raw.iter().map(cell_value));
        rows.push(row);
    }

    log::debug!("loaded {} row(s) from {}#{name}", rows.len(), path.display());
    Ok(LoadedSheet { name, rows })
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        Data::String(v) => CellValue::String(v.clone()),
        Data::Float(v) => CellValue::Number(*v),
        Data::Int(v) => CellValue::Number(*v as f64),
        Data::Bool(v) => CellValue::Boolean(*v),
        Data::DateTime(v) => match v.as_datetime() {
            Some(dt) => CellValue::Date(dt),
            None => CellValue::Number(v.as_f64()),
        },
        Data::DateTimeIso(v) => match parse_iso_datetime(v) {
            Some(dt) => CellValue::Date(dt),
            None => CellValue::String(v.clone()),
        },
        Data::DurationIso(v) => CellValue::String(v.clone()),
        Data::Error(v) => CellValue::String(v.to_string()),
    }
}

fn parse_iso_datetime(text: &str) -> Option<NaiveDateTime> {
    text.parse::<NaiveDateTime>()
        .ok()
        .or_else(|| text.parse::<NaiveDate>().ok()?.and_hms_opt(0, 0, 0))
}
