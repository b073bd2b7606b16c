//! Compare command - build two versions of a project and diff their API

use std::path::Path;
use std::time::Instant;

use anyhow::Context;
use colored::Colorize;
use tracing::{debug, info};

use sdkdiff_core::{
    AbiGenerator, LibraryAnalyzer, LocalFileHandler, Pipeline, PipelineStages, ProjectSource,
    SdkDumpAnalyzer, SdkDumpGenerator,
};

use super::{create_spinner, exit_code, write_report};
use crate::builder::{ShellPackageDescriber, ShellProjectBuilder};
use crate::config::SdkdiffConfig;
use crate::output::OutputFormat;

/// Options for one `compare` invocation.
#[derive(Debug)]
pub struct CompareOptions<'a> {
    pub old: &'a str,
    pub new: &'a str,
    pub scheme: Option<&'a str>,
    pub output: Option<&'a Path>,
    pub format: OutputFormat,
    pub fail_on_breaking_only: bool,
    pub quiet: bool,
}

/// Wire the production stages from configuration.
pub fn stages(config: &SdkdiffConfig, format: OutputFormat) -> PipelineStages {
    let files = LocalFileHandler::new();
    PipelineStages {
        project_builder: Box::new(ShellProjectBuilder::new(config.build.clone())),
        abi_generator: Box::new(AbiGenerator::with_layout(files, config.dump.clone())),
        library_analyzer: Box::new(LibraryAnalyzer::with_layout(
            files,
            ShellPackageDescriber::new(config.build.describe_command.clone()),
            config.dump.clone(),
        )),
        dump_generator: Box::new(SdkDumpGenerator::new(files)),
        dump_analyzer: Box::new(SdkDumpAnalyzer::new()),
        output_generator: format.generator(),
    }
}

pub fn run(options: CompareOptions<'_>, config: &SdkdiffConfig) -> anyhow::Result<u8> {
    let start = Instant::now();

    let old_source: ProjectSource = options
        .old
        .parse()
        .with_context(|| format!("Invalid old source `{}`", options.old))?;
    let new_source: ProjectSource = options
        .new
        .parse()
        .with_context(|| format!("Invalid new source `{}`", options.new))?;

    if old_source.is_remote() || new_source.is_remote() {
        debug!(
            "Remote sources are cloned into {}",
            config.build.work_dir.display()
        );
    }

    let pipeline = Pipeline::new(
        old_source,
        new_source,
        options.scheme.map(str::to_string),
        stages(config, options.format),
    );

    let spinner = create_spinner(options.quiet);
    spinner.set_message(format!(
        "Comparing {} to {}...",
        pipeline.new_source(),
        pipeline.old_source()
    ));
    let outcome = pipeline.run_changes();
    spinner.finish_and_clear();

    let outcome = outcome.context("Comparison failed")?;
    let report = pipeline
        .render(&outcome)
        .context("Failed to render report")?;
    write_report(&report, options.output)?;

    let summary = outcome.summary();
    info!("Compared in {:?}", start.elapsed());
    if !options.quiet {
        let line = format!(
            "{} across {} target(s)",
            summary.text(),
            outcome.all_targets.len()
        );
        if summary.breaking_changes > 0 {
            eprintln!("{}", line.red().bold());
        } else {
            eprintln!("{}", line.dimmed());
        }
    }

    Ok(exit_code(
        outcome.has_changes(),
        outcome.has_breaking_changes(),
        options.fail_on_breaking_only,
    ))
}
