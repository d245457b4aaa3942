//! `testid`: add `@pytest.mark.test_id('<uuid>')` to every unmarked test.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::*;

use testid::batch::{Batch, Discovery, FileReport, Mode};
use testid::config::Config;
use testid::logging::init_tracing;
use testid::report::BatchReport;

#[derive(Parser, Debug)]
#[command(name = "testid", version, about = "Stamp pytest tests with unique test_id markers")]
struct Cli {
    /// Files or directories to process.
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Do not write; exit with status 1 if any test lacks a marker.
    #[arg(long, conflicts_with = "dry_run")]
    check: bool,

    /// Do not write; report what would change.
    #[arg(long)]
    dry_run: bool,

    /// Canonical marker name.
    #[arg(long, env = "TESTID_MARKER")]
    marker: Option<String>,

    /// Name prefix that identifies test functions.
    #[arg(long)]
    prefix: Option<String>,

    /// Config file (defaults to ./testid.toml, then the user config dir).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Report format.
    #[arg(long, value_enum, default_value_t = Format::Human)]
    format: Format,

    /// More logging (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Human,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<u8> {
    if cli.format == Format::Json || !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }
    init_tracing(cli.verbose).map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let mut config = Config::resolve(cli.config.as_deref(), &cwd).context("Failed to load config")?;
    if let Some(marker) = cli.marker {
        config.marker = marker;
    }
    if let Some(prefix) = cli.prefix {
        config.test_prefix = prefix;
    }

    let annotator = config.annotator().context("Invalid configuration")?;
    let discovery = Discovery::from_config(&config).context("Invalid configuration")?;

    let mode = if cli.check {
        Mode::Check
    } else if cli.dry_run {
        Mode::DryRun
    } else {
        Mode::Write
    };

    let discovered = discovery.discover(&cli.paths);
    tracing::info!(files = discovered.files.len(), ?mode, "starting batch");

    let mut files: Vec<FileReport> = discovered.errors.into_iter().map(FileReport::failed).collect();
    files.extend(Batch::new(&annotator, mode).run(&discovered.files));
    let report = BatchReport::new(mode, files);

    match cli.format {
        Format::Human => print!("{}", report.render_human()),
        Format::Json => println!("{}", report.to_json().context("Failed to render report")?),
    }

    Ok(report.exit_code() as u8)
}
