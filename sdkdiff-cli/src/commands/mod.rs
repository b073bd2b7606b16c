//! Command implementations for the sdkdiff CLI
//!
//! Each command module provides a `run` function returning the process exit
//! code: 0 when nothing relevant changed, 1 when it did. Errors bubble up to
//! `main`, which maps them to 2.

pub mod compare;
pub mod dumps;

use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

/// Exit code when no relevant change was found.
pub const EXIT_CLEAN: u8 = 0;
/// Exit code when relevant changes were found.
pub const EXIT_CHANGES: u8 = 1;

/// Map a diff result to an exit code.
///
/// With `fail_on_breaking_only`, purely additive changes exit cleanly.
pub fn exit_code(has_changes: bool, has_breaking: bool, fail_on_breaking_only: bool) -> u8 {
    let failing = if fail_on_breaking_only {
        has_breaking
    } else {
        has_changes
    };
    if failing {
        EXIT_CHANGES
    } else {
        EXIT_CLEAN
    }
}

/// Print the report to stdout or write it to `output`.
pub fn write_report(report: &str, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, report)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            eprintln!("{} {}", "Report written to".green(), path.display());
        }
        None => println!("{}", report.trim_end()),
    }
    Ok(())
}

/// Spinner shown while long-running stages execute.
pub fn create_spinner(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    spinner
}
