use crate::OutputFormat;
use crate::commands::InternalError;
use crate::loader::load_sheet;
use crate::output::{json, text};
use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::{Args, ValueEnum};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use table_diff::{
    ComparisonConfig, Dataset, DateGranularity, DiffReport, DuplicateKeyPolicy, diff_datasets,
};

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

#[derive(Clone, Copy, ValueEnum, PartialEq, Eq, Debug)]
pub enum DuplicatesArg {
    First,
    Last,
    Error,
}

impl From<DuplicatesArg> for DuplicateKeyPolicy {
    fn from(value: DuplicatesArg) -> Self {
        match value {
            DuplicatesArg::First => DuplicateKeyPolicy::FirstWins,
            DuplicatesArg::Last => DuplicateKeyPolicy::LastWins,
            DuplicatesArg::Error => DuplicateKeyPolicy::Error,
        }
    }
}

#[derive(Clone, Copy, ValueEnum, PartialEq, Eq, Debug)]
pub enum GranularityArg {
    Exact,
    Second,
    Minute,
    Day,
}

impl From<GranularityArg> for DateGranularity {
    fn from(value: GranularityArg) -> Self {
        match value {
            GranularityArg::Exact => DateGranularity::Exact,
            GranularityArg::Second => DateGranularity::Second,
            GranularityArg::Minute => DateGranularity::Minute,
            GranularityArg::Day => DateGranularity::Day,
        }
    }
}

#[derive(Args, Debug)]
pub struct DiffArgs {
    #[arg(help = "Path to the old/base table (csv, xlsx, xlsm, xlsb, xls, ods)")]
    pub old: PathBuf,
    #[arg(help = "Path to the new/changed table")]
    pub new: PathBuf,
    #[arg(
        long = "key",
        short = 'k',
        value_name = "COLUMN",
        num_args = 1..,
        help = "Key column(s) identifying a row; multi-row headers are joined with '/'"
    )]
    pub keys: Vec<String>,
    #[arg(
        long = "ignore",
        short = 'i',
        value_name = "COLUMN",
        num_args = 1..,
        help = "Column(s) excluded from cell comparison"
    )]
    pub ignore: Vec<String>,
    #[arg(long, value_name = "NAME", help = "Sheet of the old workbook (default: first sheet)")]
    pub sheet1: Option<String>,
    #[arg(long, value_name = "NAME", help = "Sheet of the new workbook (default: first sheet)")]
    pub sheet2: Option<String>,
    #[arg(long, value_name = "ROW", default_value_t = 1, help = "1-based row where the old header starts")]
    pub header1: usize,
    #[arg(long, value_name = "ROW", default_value_t = 1, help = "1-based row where the new header starts")]
    pub header2: usize,
    #[arg(long, value_name = "N", default_value_t = 1, help = "Number of header rows (merged headers are flattened)")]
    pub header_rows: usize,
    #[arg(long, value_name = "FILE", help = "JSON comparison config; flags override its values")]
    pub config: Option<PathBuf>,
    #[arg(long, value_enum, help = "How repeated keys within one table are handled")]
    pub duplicates: Option<DuplicatesArg>,
    #[arg(long, value_name = "X", help = "Absolute numeric tolerance")]
    pub abs_epsilon: Option<f64>,
    #[arg(long, value_name = "X", help = "Relative numeric tolerance")]
    pub rel_epsilon: Option<f64>,
    #[arg(long, value_enum, help = "Resolution at which dates are compared")]
    pub date_granularity: Option<GranularityArg>,
    #[arg(long, short, value_enum, default_value = "text", help = "Output format")]
    pub format: OutputFormat,
    #[arg(long, short, value_name = "PATH", help = "Write the report to a file instead of stdout")]
    pub output: Option<PathBuf>,
    #[arg(long, short, help = "Quiet mode: only show the overview")]
    pub quiet: bool,
    #[arg(long, short, help = "Verbose mode: show key issues and debug logging")]
    pub verbose: bool,
}

/// Paths and time of a run, shown in the text overview.
pub struct RunInfo<'a> {
    pub old_path: &'a Path,
    pub new_path: &'a Path,
    pub compared_at: String,
}

pub fn run(args: DiffArgs) -> Result<ExitCode> {
    if args.quiet && args.verbose {
        bail!("Cannot use both --quiet and --verbose flags together");
    }
    if args.header1 == 0 || args.header2 == 0 {
        bail!("--header1/--header2 are 1-based row numbers");
    }

    let verbosity = if args.quiet {
        Verbosity::Quiet
    } else if args.verbose {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    };

    let config = build_config(&args)?;

    let old = load_dataset(&args.old, args.sheet1.as_deref(), args.header1, args.header_rows)
        .with_context(|| format!("Failed to load old table: {}", args.old.display()))?;
    let new = load_dataset(&args.new, args.sheet2.as_deref(), args.header2, args.header_rows)
        .with_context(|| format!("Failed to load new table: {}", args.new.display()))?;

    let report = diff_datasets(&old, &new, &config).context("Comparison failed")?;

    let info = RunInfo {
        old_path: &args.old,
        new_path: &args.new,
        compared_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    };

    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    write_report(&mut writer, &report, &info, args.format, verbosity)
        .context(InternalError("failed to write the report"))?;

    if let Some(path) = &args.output {
        if verbosity != Verbosity::Quiet {
            eprintln!("Report written to {}", path.display());
        }
    }

    Ok(exit_code_from_report(&report))
}

fn write_report<W: Write>(
    w: &mut W,
    report: &DiffReport,
    info: &RunInfo<'_>,
    format: OutputFormat,
    verbosity: Verbosity,
) -> Result<()> {
    match format {
        OutputFormat::Text => text::write_text_report(w, report, info, verbosity)?,
        OutputFormat::Json => json::write_json_report(w, report)?,
        OutputFormat::Cells => json::write_cell_records(w, report)?,
    }
    w.flush()?;
    Ok(())
}

fn build_config(args: &DiffArgs) -> Result<ComparisonConfig> {
    let mut base = match &args.config {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            serde_json::from_reader::<_, ComparisonConfig>(io::BufReader::new(file))
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        }
        None => ComparisonConfig::default(),
    };

    if !args.keys.is_empty() {
        base.key_columns = args.keys.clone();
    }
    if !args.ignore.is_empty() {
        base.ignore_columns.clear();
    }
    let file_ignores = std::mem::take(&mut base.ignore_columns);

    let mut builder = base
        .into_builder()
        .ignore_columns(file_ignores)
        .ignore_columns(args.ignore.iter().cloned());
    if let Some(policy) = args.duplicates {
        builder = builder.duplicate_key_policy(policy.into());
    }
    if let Some(value) = args.abs_epsilon {
        builder = builder.absolute_epsilon(value);
    }
    if let Some(value) = args.rel_epsilon {
        builder = builder.relative_epsilon(value);
    }
    if let Some(granularity) = args.date_granularity {
        builder = builder.date_granularity(granularity.into());
    }

    builder.build().context("Invalid comparison settings")
}

fn load_dataset(
    path: &Path,
    sheet: Option<&str>,
    header_row: usize,
    header_rows: usize,
) -> Result<Dataset> {
    let loaded = load_sheet(path, sheet)?;
    let dataset = Dataset::from_sheet(&loaded.rows, header_row - 1, header_rows)
        .with_context(|| format!("Failed to read header of sheet '{}'", loaded.name))?;
    log::debug!(
        "{}: {} column(s), {} data row(s)",
        path.display(),
        dataset.columns().len(),
        dataset.len()
    );
    Ok(dataset)
}

fn exit_code_from_report(report: &DiffReport) -> ExitCode {
    if report.has_differences() {
        ExitCode::from(1)
    } else {
        ExitCode::from(0)
    }
}
