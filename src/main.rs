//! `sql-history`: read a SQL file of `CREATE TABLE` statements and write the
//! matching history tables and triggers.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use sql_history::{Config, Error, UserSource, generate_history_sql, parse_create_tables};
use tracing::debug;
use tracing_subscriber::{EnvFilter, prelude::*};

/// Generate history tables and change-tracking triggers from CREATE TABLE
/// statements.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// SQL file containing CREATE TABLE statements.
    input: PathBuf,

    /// Output file [default: <INPUT stem>_history.<INPUT extension>]
    output: Option<PathBuf>,

    /// Add a `changed_by` column to history tables.
    #[arg(long)]
    track_user: bool,

    /// Source of the `changed_by` value: `current_user` or `session`.
    #[arg(long, value_name = "SOURCE", default_value = "current_user")]
    user_source: UserSource,

    /// Append commented point-in-time query examples for each table.
    #[arg(long)]
    examples: bool,

    /// Log parsing and generation details.
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn config(&self) -> Config {
        Config::default()
            .with_track_user(self.track_user)
            .with_user_source(self.user_source)
            .with_point_in_time_examples(self.examples)
    }

    fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| default_output_path(&self.input))
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr, keeping stdout for the summary.
fn init_tracing(verbose: bool) {
    let default_directive = if verbose {
        "sql_history=debug"
    } else {
        "sql_history=info"
    };
    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr);

    let _ = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init();
}

fn run(args: &Args) -> Result<()> {
    let output = args.output_path();

    let sql = fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read input file {}", args.input.display()))?;

    let tables = parse_create_tables(&sql);
    if tables.is_empty() {
        return Err(Error::NoTables.into());
    }
    debug!(
        input = %args.input.display(),
        tables = tables.len(),
        "parsed input"
    );

    let script = generate_history_sql(&tables, args.config());
    fs::write(&output, script)
        .with_context(|| format!("Failed to write output file {}", output.display()))?;

    println!("Successfully processed {} table(s)", tables.len());
    println!(
        "Generated history tables and triggers in: {}",
        output.display()
    );
    for table in &tables {
        println!(
            "  - {} -> {}",
            table.qualified_name(),
            table.history_table_name()
        );
    }

    Ok(())
}

/// `<stem>_history.<ext>` in the input's directory.
fn default_output_path(input: &Path) -> PathBuf {
    let mut name = input.file_stem().unwrap_or_default().to_os_string();
    name.push("_history");
    if let Some(extension) = input.extension() {
        name.push(".");
        name.push(extension);
    }
    input.with_file_name(name)
}
