//! sdkdiff CLI - detect public API changes between two versions of a Swift SDK
//!
//! Builds both versions, reads the API dumps the compiler emits for every
//! target and reports additions, removals and modifications.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod builder;
mod commands;
mod config;
mod output;

use commands::{compare, dumps};
use config::SdkdiffConfig;
use output::OutputFormat;

/// Exit code for any error (build failure, missing targets, bad input).
const EXIT_ERROR: u8 = 2;

/// Public API breakage detection for Swift packages and projects.
#[derive(Parser)]
#[command(name = "sdkdiff")]
#[command(author, version)]
#[command(about = "Detect public API changes between two versions of a Swift SDK")]
#[command(propagate_version = true)]
#[command(after_help = "Sources:
  ./path/to/checkout          Local directory, built in place
  main~https://host/repo.git  Branch of a remote repository

Exit codes:
  0  no changes
  1  changes detected
  2  error

Examples:
  sdkdiff compare --old 1.2.0~https://github.com/acme/sdk.git --new .
  sdkdiff compare --old ../sdk-old --new . --scheme SDK --format table
  sdkdiff dumps old/Core.swiftmodule/abi.json new/Core.swiftmodule/abi.json")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format (overrides config default)
    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,

    /// Write the report to a file instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Only exit with 1 when a change is breaking
    #[arg(long, global = true)]
    fail_on_breaking_only: bool,

    /// Configuration file (default: ./.sdkdiff.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build two versions of a project and compare their public API
    #[command(visible_alias = "c")]
    Compare {
        /// Baseline version: a local path or `branch~repository`
        #[arg(long)]
        old: String,

        /// Version to check: a local path or `branch~repository`
        #[arg(long)]
        new: String,

        /// Xcode scheme to build (omit for Swift packages)
        #[arg(long)]
        scheme: Option<String>,
    },

    /// Compare two existing API dump files
    Dumps {
        /// Baseline dump (abi.json)
        old: PathBuf,

        /// Dump to check (abi.json)
        new: PathBuf,

        /// Target name used in the report (default: derived from the path)
        #[arg(short, long)]
        target: Option<String>,
    },
}

/// Setup logging based on verbosity flags
fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}

fn run(cli: Cli) -> anyhow::Result<u8> {
    let config = match &cli.config {
        Some(path) => SdkdiffConfig::load_file(path),
        None => SdkdiffConfig::load(Path::new(".")),
    };

    // CLI flag > config default > Markdown
    let format = cli.format.unwrap_or_else(|| {
        config
            .default_format()
            .and_then(|f| f.parse().ok())
            .unwrap_or_default()
    });

    if let Some(use_color) = config.use_color() {
        colored::control::set_override(use_color);
    }

    match cli.command {
        Commands::Compare { old, new, scheme } => compare::run(
            compare::CompareOptions {
                old: &old,
                new: &new,
                scheme: scheme.as_deref(),
                output: cli.output.as_deref(),
                format,
                fail_on_breaking_only: cli.fail_on_breaking_only,
                quiet: cli.quiet,
            },
            &config,
        ),
        Commands::Dumps { old, new, target } => dumps::run(dumps::DumpsOptions {
            old: &old,
            new: &new,
            target: target.as_deref(),
            output: cli.output.as_deref(),
            format,
            fail_on_breaking_only: cli.fail_on_breaking_only,
        }),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
