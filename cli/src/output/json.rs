use anyhow::Result;
use std::io::Write;
use table_diff::{DiffReport, report_to_cell_records};

pub fn write_json_report<W: Write>(w: &mut W, report: &DiffReport) -> Result<()> {
    serde_json::to_writer_pretty(&mut *w, report)?;
    writeln!(w)?;
    Ok(())
}

pub fn write_cell_records<W: Write>(w: &mut W, report: &DiffReport) -> Result<()> {
    let records = report_to_cell_records(report);
    serde_json::to_writer_pretty(&mut *w, &records)?;
    writeln!(w)?;
    Ok(())
}
