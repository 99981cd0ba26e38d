mod commands;
mod loader;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use log::{LevelFilter, Metadata, Record};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "table-diff")]
#[command(about = "Compare two spreadsheet or CSV tables row by row using key columns")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Compare two tables by key columns")]
    Diff(commands::diff::DiffArgs),
    #[command(about = "Print the resolved column identifiers of a sheet")]
    Headers(commands::headers::HeadersArgs),
}

#[derive(Clone, Copy, ValueEnum, PartialEq, Eq, Debug)]
pub enum OutputFormat {
    Text,
    Json,
    /// One flat record per modified cell.
    Cells,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let verbose = matches!(&cli.command, Commands::Diff(args) if args.verbose);
    init_logging(verbose);

    let result = match cli.command {
        Commands::Diff(args) => commands::diff::run(args),
        Commands::Headers(args) => commands::headers::run(args),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            exit_code_for_error(&e)
        }
    }
}

fn exit_code_for_error(err: &anyhow::Error) -> ExitCode {
    if is_internal_error(err) {
        ExitCode::from(3)
    } else {
        ExitCode::from(2)
    }
}

fn is_internal_error(err: &anyhow::Error) -> bool {
    err.downcast_ref::<commands::InternalError>().is_some()
}

struct SimpleLogger;

impl log::Log for SimpleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

fn init_logging(verbose: bool) {
    static LOGGER: SimpleLogger = SimpleLogger;
    let _ = log::set_logger(&LOGGER);
    let level = log_level_from_env();
    log::set_max_level(if verbose {
        level.max(LevelFilter::Debug)
    } else {
        level
    });
}

fn log_level_from_env() -> LevelFilter {
    match std::env::var("TABLE_DIFF_LOG").as_deref() {
        Ok("error") => LevelFilter::Error,
        Ok("warn") => LevelFilter::Warn,
        Ok("info") => LevelFilter::Info,
        Ok("debug") => LevelFilter::Debug,
        Ok("trace") => LevelFilter::Trace,
        Ok("off") => LevelFilter::Off,
        _ => LevelFilter::Warn,
    }
}
