//! Error types for sdkdiff-core.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for sdkdiff-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running the diff pipeline.
///
/// The diff engine itself never fails; every variant here comes from one of
/// the external steps around it.
#[derive(Error, Debug)]
pub enum Error {
    /// An external build step failed. Aborts the whole run.
    #[error("Failed to build {source_description}: {message}")]
    Build {
        /// Human-readable description of the project source.
        source_description: String,
        /// Output or reason reported by the build tool.
        message: String,
    },

    /// Neither build produced any dump.
    #[error("No target found: neither version produced an API dump")]
    NoTargetFound,

    /// A build succeeded but the expected dump artifact is missing.
    #[error("No API dump produced for target `{target}` (expected at {})", path.display())]
    NoDumpProduced {
        /// Target the dump was expected for.
        target: String,
        /// Location that was searched.
        path: PathBuf,
    },

    /// A dump file exists but is not a valid dump.
    #[error("Failed to parse API dump {}: {message}", path.display())]
    DumpParse {
        /// Dump file that failed to parse.
        path: PathBuf,
        /// Description of the parse failure.
        message: String,
    },

    /// The set of libraries of a build could not be determined.
    #[error("Library analysis failed: {message}")]
    LibraryAnalysis {
        /// Description of the failure.
        message: String,
    },

    /// A project source string could not be interpreted.
    #[error("Invalid project source `{0}`")]
    InvalidSource(String),

    /// Report rendering failed.
    #[error("Output generation failed: {message}")]
    Output {
        /// Description of the failure.
        message: String,
    },

    /// IO error from a file-system port.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error outside of dump parsing.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error only affects a single target.
    ///
    /// Per-target errors are absorbed into the change map by the pipeline;
    /// everything else aborts the run.
    pub fn is_target_local(&self) -> bool {
        matches!(
            self,
            Error::NoDumpProduced { .. } | Error::DumpParse { .. } | Error::Io(_)
        )
    }
}
