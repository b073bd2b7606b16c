//! Narrow interfaces to the outside world.
//!
//! The pipeline only reaches the file system, the shell and the build tools
//! through these traits, so every stage can be tested with in-memory fakes.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use crate::error::{Error, Result};
use crate::source::ProjectSource;

/// Read-only file-system access.
pub trait FileHandling: Send + Sync {
    fn exists(&self, path: &Path) -> bool;

    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Entry names of a directory, sorted.
    fn list_dir(&self, path: &Path) -> Result<Vec<String>>;

    /// Every file below `root` whose name ends with `suffix`, sorted.
    fn find_files(&self, root: &Path, suffix: &str) -> Result<Vec<PathBuf>>;
}

/// Compiles a project into a local directory holding its build products.
pub trait ProjectBuilding: Send + Sync {
    /// Returns the project directory the build ran in.
    fn build(&self, source: &ProjectSource, scheme: Option<&str>) -> Result<PathBuf>;
}

/// Produces the JSON package description of a package directory.
pub trait PackageDescribing: Send + Sync {
    fn describe(&self, project_dir: &Path) -> Result<String>;
}

/// File-system backed [`FileHandling`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileHandler;

impl LocalFileHandler {
    pub fn new() -> Self {
        Self
    }
}

impl FileHandling for LocalFileHandler {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        Ok(fs::read_to_string(path)?)
    }

    fn list_dir(&self, path: &Path) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    fn find_files(&self, root: &Path, suffix: &str) -> Result<Vec<PathBuf>> {
        if !root.exists() {
            return Ok(Vec::new());
        }

        // Build directories are usually gitignored; walk them anyway.
        let walker = WalkBuilder::new(root)
            .hidden(false)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .ignore(false)
            .parents(false)
            .follow_links(false)
            .build();

        // An unreadable subdirectory would hide its dumps, so it fails the walk.
        let mut files = Vec::new();
        for entry in walker {
            let entry = entry.map_err(walk_error)?;
            if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                continue;
            }
            let path = entry.into_path();
            let matches = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.ends_with(suffix))
                .unwrap_or(false);
            if matches {
                files.push(path);
            }
        }

        files.sort();
        Ok(files)
    }
}

fn walk_error(err: ignore::Error) -> Error {
    let message = err.to_string();
    match err.into_io_error() {
        Some(source) => Error::Io(io::Error::new(source.kind(), message)),
        None => Error::Io(io::Error::other(message)),
    }
}
