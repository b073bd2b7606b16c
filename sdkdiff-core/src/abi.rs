//! Locating the API dumps a build produced.
//!
//! Package builds (no scheme) leave one `<Target>.swiftmodule` directory per
//! compilation target somewhere below the build directory. Project builds
//! (scheme given) produce a single framework whose module directory holds
//! the dump.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::ports::FileHandling;

const DUMP_FILE_SUFFIX: &str = "abi.json";
const MODULE_DIR_EXTENSION: &str = "swiftmodule";

/// One located dump.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AbiGeneratorOutput {
    pub target_name: String,
    pub abi_json_path: PathBuf,
}

impl AbiGeneratorOutput {
    pub fn new(target_name: impl Into<String>, abi_json_path: impl Into<PathBuf>) -> Self {
        Self {
            target_name: target_name.into(),
            abi_json_path: abi_json_path.into(),
        }
    }
}

/// Locates dump files for a built project.
pub trait AbiGenerating: Send + Sync {
    fn generate(&self, project_dir: &Path, scheme: Option<&str>) -> Result<Vec<AbiGeneratorOutput>>;
}

/// Where build products live, relative to the project directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DumpLayout {
    /// Root searched recursively in package mode.
    pub build_dir: PathBuf,
    /// Directory holding `<scheme>.framework` in project mode.
    pub products_dir: PathBuf,
}

impl Default for DumpLayout {
    fn default() -> Self {
        Self {
            build_dir: PathBuf::from(".build"),
            products_dir: PathBuf::from(".build/Build/Products/Debug-maccatalyst"),
        }
    }
}

impl DumpLayout {
    /// Module directory of a scheme's framework.
    pub fn framework_module_dir(&self, project_dir: &Path, scheme: &str) -> PathBuf {
        project_dir
            .join(&self.products_dir)
            .join(format!("{}.framework", scheme))
            .join("Modules")
            .join(format!("{}.{}", scheme, MODULE_DIR_EXTENSION))
    }
}

/// [`AbiGenerating`] backed by a [`FileHandling`] port.
#[derive(Debug, Clone)]
pub struct AbiGenerator<F> {
    files: F,
    layout: DumpLayout,
}

impl<F: FileHandling> AbiGenerator<F> {
    pub fn new(files: F) -> Self {
        Self::with_layout(files, DumpLayout::default())
    }

    pub fn with_layout(files: F, layout: DumpLayout) -> Self {
        Self { files, layout }
    }

    fn generate_for_package(&self, project_dir: &Path) -> Result<Vec<AbiGeneratorOutput>> {
        info!("📋 Generating ABI files for `{}`", project_dir.display());

        let root = project_dir.join(&self.layout.build_dir);
        let candidates = self.files.find_files(&root, DUMP_FILE_SUFFIX)?;

        // Candidates are sorted, so the first path per target wins.
        let mut by_target: BTreeMap<String, PathBuf> = BTreeMap::new();
        for path in candidates {
            if !is_dump_file_name(&path) {
                continue;
            }
            let Some(target) = module_dir_target(&path) else {
                continue;
            };
            debug!("- `{}` ({})", target, path.display());
            by_target.entry(target).or_insert(path);
        }

        Ok(by_target
            .into_iter()
            .map(|(target, path)| AbiGeneratorOutput::new(target, path))
            .collect())
    }

    fn generate_for_project(&self, project_dir: &Path, scheme: &str) -> Result<Vec<AbiGeneratorOutput>> {
        info!("📋 Locating ABI file for `{}`", project_dir.display());

        let module_dir = self.layout.framework_module_dir(project_dir, scheme);
        let missing = || Error::NoDumpProduced {
            target: scheme.to_string(),
            path: module_dir.clone(),
        };

        if !self.files.exists(&module_dir) {
            return Err(missing());
        }

        let entries = self.files.list_dir(&module_dir).map_err(|_| missing())?;
        for entry in &entries {
            debug!("- `{}`", entry);
        }

        let file = entries
            .iter()
            .find(|entry| entry.ends_with(DUMP_FILE_SUFFIX))
            .ok_or_else(missing)?;

        Ok(vec![AbiGeneratorOutput::new(scheme, module_dir.join(file))])
    }
}

impl<F: FileHandling> AbiGenerating for AbiGenerator<F> {
    fn generate(&self, project_dir: &Path, scheme: Option<&str>) -> Result<Vec<AbiGeneratorOutput>> {
        match scheme {
            Some(scheme) => self.generate_for_project(project_dir, scheme),
            None => self.generate_for_package(project_dir),
        }
    }
}

fn is_dump_file_name(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n == DUMP_FILE_SUFFIX || n.ends_with(".abi.json"))
        .unwrap_or(false)
}

/// Target name from a `<Target>.swiftmodule` parent directory.
fn module_dir_target(path: &Path) -> Option<String> {
    let parent = path.parent()?;
    if parent.extension()?.to_str()? != MODULE_DIR_EXTENSION {
        return None;
    }
    parent.file_stem()?.to_str().map(str::to_string)
}
