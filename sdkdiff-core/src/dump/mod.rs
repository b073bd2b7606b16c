//! Reading raw API dumps into [`SdkDump`]s.
//!
//! The raw format is the `abi.json` document written by the Swift API
//! digester. Parsing lives in [`raw`]; turning the raw node soup into the
//! normalized tree (public surface only, signatures assembled from type
//! nodes) lives in [`normalize`].

pub mod normalize;
pub mod raw;

use tracing::debug;

use crate::abi::AbiGeneratorOutput;
use crate::error::{Error, Result};
use crate::model::SdkDump;
use crate::ports::FileHandling;

pub use normalize::{normalize, normalize_type_name};
pub use raw::RawDump;

/// Turns a located dump file into a normalized [`SdkDump`].
pub trait SdkDumpGenerating: Send + Sync {
    fn generate(&self, output: &AbiGeneratorOutput) -> Result<SdkDump>;
}

/// Parse a raw dump document.
pub fn parse_dump(contents: &str) -> serde_json::Result<RawDump> {
    serde_json::from_str(contents)
}

/// [`SdkDumpGenerating`] backed by a [`FileHandling`] port.
#[derive(Debug, Clone)]
pub struct SdkDumpGenerator<F> {
    files: F,
}

impl<F: FileHandling> SdkDumpGenerator<F> {
    pub fn new(files: F) -> Self {
        Self { files }
    }
}

impl<F: FileHandling> SdkDumpGenerating for SdkDumpGenerator<F> {
    fn generate(&self, output: &AbiGeneratorOutput) -> Result<SdkDump> {
        let path = &output.abi_json_path;
        if !self.files.exists(path) {
            return Err(Error::NoDumpProduced {
                target: output.target_name.clone(),
                path: path.clone(),
            });
        }

        let contents = self.files.read_to_string(path)?;
        let raw = parse_dump(&contents).map_err(|e| Error::DumpParse {
            path: path.clone(),
            message: e.to_string(),
        })?;

        let dump = normalize(&output.target_name, &raw);
        debug!(
            "Loaded {} public declarations for `{}` from {}",
            dump.declaration_count(),
            output.target_name,
            path.display()
        );
        Ok(dump)
    }
}
