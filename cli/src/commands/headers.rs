use crate::loader::load_sheet;
use anyhow::{Context, Result, bail};
use clap::Args;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use table_diff::resolve_headers;

#[derive(Args, Debug)]
pub struct HeadersArgs {
    #[arg(help = "Path to the table (csv, xlsx, xlsm, xlsb, xls, ods)")]
    pub path: PathBuf,
    #[arg(long, short, value_name = "NAME", help = "Sheet name (default: first sheet)")]
    pub sheet: Option<String>,
    #[arg(long, value_name = "ROW", default_value_t = 1, help = "1-based row where the header starts")]
    pub start: usize,
    #[arg(long, short, value_name = "N", default_value_t = 1, help = "Number of header rows")]
    pub rows: usize,
}

/// Prints one line per column: its 1-based position and resolved identifier.
pub fn run(args: HeadersArgs) -> Result<ExitCode> {
    if args.start == 0 {
        bail!("--start is a 1-based row number");
    }

    let loaded = load_sheet(&args.path, args.sheet.as_deref())
        .with_context(|| format!("Failed to load table: {}", args.path.display()))?;

    let header_text: Vec<Vec<String>> = loaded
        .rows
        .iter()
        .skip(args.start - 1)
        .take(args.rows)
        .map(|row| row.iter().map(ToString::to_string).collect())
        .collect();
    let paths = resolve_headers(&header_text, args.rows)
        .with_context(|| format!("Failed to resolve headers of sheet '{}'", loaded.name))?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(
        handle,
        "Sheet \"{}\": {} column(s) from {} header row(s)",
        loaded.name,
        paths.len(),
        args.rows
    )?;
    for (idx, path) in paths.iter().enumerate() {
        writeln!(handle, "  Column {}: {}", idx + 1, path)?;
    }

    Ok(ExitCode::from(0))
}
