//! Dumps command - diff two existing API dump files without building

use std::path::Path;

use anyhow::Context;

use sdkdiff_core::{
    AbiGeneratorOutput, Change, ChangeMap, LocalFileHandler, ProjectSource, SdkDumpAnalyzer,
    SdkDumpAnalyzing, SdkDumpGenerating, SdkDumpGenerator,
};

use super::{exit_code, write_report};
use crate::output::OutputFormat;

const DEFAULT_TARGET: &str = "Target";
const MODULE_DIR_EXTENSION: &str = "swiftmodule";

/// Options for one `dumps` invocation.
#[derive(Debug)]
pub struct DumpsOptions<'a> {
    pub old: &'a Path,
    pub new: &'a Path,
    pub target: Option<&'a str>,
    pub output: Option<&'a Path>,
    pub format: OutputFormat,
    pub fail_on_breaking_only: bool,
}

/// Target name implied by a dump path.
///
/// `Foo.swiftmodule/abi.json` names `Foo`; anything else falls back to a
/// generic name.
pub fn target_name_for(path: &Path) -> String {
    path.parent()
        .filter(|dir| dir.extension().is_some_and(|ext| ext == MODULE_DIR_EXTENSION))
        .and_then(|dir| dir.file_stem())
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_TARGET.to_string())
}

pub fn run(options: DumpsOptions<'_>) -> anyhow::Result<u8> {
    let target = options
        .target
        .map(str::to_string)
        .unwrap_or_else(|| target_name_for(options.new));

    let generator = SdkDumpGenerator::new(LocalFileHandler::new());
    let old = generator
        .generate(&AbiGeneratorOutput::new(&target, options.old))
        .with_context(|| format!("Failed to load {}", options.old.display()))?;
    let new = generator
        .generate(&AbiGeneratorOutput::new(&target, options.new))
        .with_context(|| format!("Failed to load {}", options.new.display()))?;

    let changes = SdkDumpAnalyzer::new().analyze(&old, &new);
    let has_changes = !changes.is_empty();
    let has_breaking = changes.iter().any(Change::is_breaking);

    let mut change_map = ChangeMap::new();
    if has_changes {
        change_map.insert(target.clone(), changes);
    }

    let report = options
        .format
        .generator()
        .generate(
            &change_map,
            &[target],
            &ProjectSource::local(options.old),
            &ProjectSource::local(options.new),
        )
        .context("Failed to render report")?;
    write_report(&report, options.output)?;

    Ok(exit_code(
        has_changes,
        has_breaking,
        options.fail_on_breaking_only,
    ))
}
