//! End-to-end orchestration: build, locate dumps, diff, render.

use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::abi::{AbiGenerating, AbiGeneratorOutput};
use crate::analyzer::SdkDumpAnalyzing;
use crate::changes::{Change, ChangeMap, ChangeSummary, LIBRARY_CHANGES_KEY};
use crate::dump::SdkDumpGenerating;
use crate::error::{Error, Result};
use crate::library::LibraryAnalyzing;
use crate::ports::ProjectBuilding;
use crate::report::OutputGenerating;
use crate::source::ProjectSource;

/// The collaborators a [`Pipeline`] drives.
pub struct PipelineStages {
    pub project_builder: Box<dyn ProjectBuilding>,
    pub abi_generator: Box<dyn AbiGenerating>,
    pub library_analyzer: Box<dyn LibraryAnalyzing>,
    pub dump_generator: Box<dyn SdkDumpGenerating>,
    pub dump_analyzer: Box<dyn SdkDumpAnalyzing>,
    pub output_generator: Box<dyn OutputGenerating>,
}

/// Result of a pipeline run before rendering.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PipelineOutcome {
    pub changes: ChangeMap,
    /// Sorted union of target names from both builds.
    pub all_targets: Vec<String>,
}

impl PipelineOutcome {
    pub fn has_changes(&self) -> bool {
        self.changes.values().any(|changes| !changes.is_empty())
    }

    pub fn has_breaking_changes(&self) -> bool {
        self.changes.values().flatten().any(Change::is_breaking)
    }

    pub fn summary(&self) -> ChangeSummary {
        ChangeSummary::from_map(&self.changes)
    }
}

/// Dumps located for one side of the comparison.
#[derive(Debug, Default)]
struct LocatedDumps {
    outputs: BTreeMap<String, AbiGeneratorOutput>,
    /// Targets whose dump could not be located, with the reason.
    failures: BTreeMap<String, String>,
}

impl LocatedDumps {
    fn targets(&self) -> impl Iterator<Item = &String> {
        self.outputs.keys().chain(self.failures.keys())
    }
}

/// Compares the public API of two versions of a project.
pub struct Pipeline {
    old_source: ProjectSource,
    new_source: ProjectSource,
    scheme: Option<String>,
    stages: PipelineStages,
}

impl Pipeline {
    pub fn new(
        old_source: ProjectSource,
        new_source: ProjectSource,
        scheme: Option<String>,
        stages: PipelineStages,
    ) -> Self {
        Self {
            old_source,
            new_source,
            scheme,
            stages,
        }
    }

    pub fn old_source(&self) -> &ProjectSource {
        &self.old_source
    }

    pub fn new_source(&self) -> &ProjectSource {
        &self.new_source
    }

    /// Run every stage and render the report.
    pub fn run(&self) -> Result<String> {
        let outcome = self.run_changes()?;
        self.render(&outcome)
    }

    /// Render an outcome with the configured output generator.
    pub fn render(&self, outcome: &PipelineOutcome) -> Result<String> {
        self.stages.output_generator.generate(
            &outcome.changes,
            &outcome.all_targets,
            &self.old_source,
            &self.new_source,
        )
    }

    /// Run every stage up to, but excluding, rendering.
    pub fn run_changes(&self) -> Result<PipelineOutcome> {
        let start = Instant::now();
        let scheme = self.scheme.as_deref();

        let (old_dir, new_dir) = self.build_both(scheme)?;

        let (old_dumps, new_dumps) =
            rayon::join(|| self.locate(&old_dir), || self.locate(&new_dir));
        let (old_dumps, new_dumps) = (old_dumps?, new_dumps?);

        let all_targets: BTreeSet<String> = old_dumps
            .targets()
            .chain(new_dumps.targets())
            .cloned()
            .collect();
        if all_targets.is_empty() {
            return Err(Error::NoTargetFound);
        }
        debug!("Targets: {:?}", all_targets);

        let mut changes = ChangeMap::new();

        let library_changes = self
            .stages
            .library_analyzer
            .analyze(&old_dir, &new_dir)?;
        if !library_changes.is_empty() {
            changes.insert(LIBRARY_CHANGES_KEY.to_string(), library_changes);
        }

        info!("🔍 Comparing {} targets", all_targets.len());
        let per_target: Vec<(String, Vec<Change>)> = all_targets
            .par_iter()
            .map(|target| {
                self.diff_target(target, &old_dumps, &new_dumps)
                    .map(|target_changes| (target.clone(), target_changes))
            })
            .collect::<Result<Vec<_>>>()?;

        changes.extend(
            per_target
                .into_iter()
                .filter(|(_, target_changes)| !target_changes.is_empty()),
        );

        let outcome = PipelineOutcome {
            changes,
            all_targets: all_targets.into_iter().collect(),
        };
        info!(
            "✅ {} in {:.2}s",
            outcome.summary().text(),
            start.elapsed().as_secs_f64()
        );
        Ok(outcome)
    }

    /// Build both sources and return their project directories.
    ///
    /// Identical sources share a checkout and build directory, so they are
    /// built once and the result is used for both sides. Distinct sources
    /// build concurrently; `rayon::join` only returns once both arms finish,
    /// so a failing build is reported after the other one completes.
    fn build_both(&self, scheme: Option<&str>) -> Result<(PathBuf, PathBuf)> {
        let builder = &self.stages.project_builder;

        if self.old_source == self.new_source {
            info!("🛠️ Building {} once for both sides", self.old_source);
            let dir = builder.build(&self.old_source, scheme)?;
            return Ok((dir.clone(), dir));
        }

        info!("🛠️ Building old and new versions");
        let (old_dir, new_dir) = rayon::join(
            || builder.build(&self.old_source, scheme),
            || builder.build(&self.new_source, scheme),
        );
        Ok((old_dir?, new_dir?))
    }

    fn locate(&self, project_dir: &Path) -> Result<LocatedDumps> {
        let mut located = LocatedDumps::default();
        match self
            .stages
            .abi_generator
            .generate(project_dir, self.scheme.as_deref())
        {
            Ok(outputs) => {
                for output in outputs {
                    located
                        .outputs
                        .entry(output.target_name.clone())
                        .or_insert(output);
                }
            }
            Err(Error::NoDumpProduced { target, path }) => {
                let err = Error::NoDumpProduced {
                    target: target.clone(),
                    path,
                };
                warn!("{}", err);
                located.failures.insert(target, err.to_string());
            }
            Err(err) => return Err(err),
        }
        Ok(located)
    }

    fn diff_target(
        &self,
        target: &str,
        old: &LocatedDumps,
        new: &LocatedDumps,
    ) -> Result<Vec<Change>> {
        if let Some(reason) = old.failures.get(target).or_else(|| new.failures.get(target)) {
            return Ok(vec![Change::target_failed(reason)]);
        }

        let (old_output, new_output) = match (old.outputs.get(target), new.outputs.get(target)) {
            (Some(old_output), Some(new_output)) => (old_output, new_output),
            (Some(_), None) => return Ok(vec![Change::removed_target()]),
            (None, Some(_)) => return Ok(vec![Change::added_target()]),
            (None, None) => return Ok(Vec::new()),
        };

        let (old_dump, new_dump) = rayon::join(
            || self.stages.dump_generator.generate(old_output),
            || self.stages.dump_generator.generate(new_output),
        );
        let dumps = old_dump.and_then(|old_dump| new_dump.map(|new_dump| (old_dump, new_dump)));

        match dumps {
            Ok((old_dump, new_dump)) => {
                let changes = self.stages.dump_analyzer.analyze(&old_dump, &new_dump);
                debug!("`{}`: {} changes", target, changes.len());
                Ok(changes)
            }
            Err(err) if err.is_target_local() => {
                warn!("Skipping target `{}`: {}", target, err);
                Ok(vec![Change::target_failed(err)])
            }
            Err(err) => Err(err),
        }
    }
}

