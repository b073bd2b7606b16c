//! sdkdiff core: public API diffing for compiled Swift modules.
//!
//! This crate builds two versions of a project, reads the API dumps the
//! compiler emitted for every target, and reports what changed in the
//! public surface.
//!
//! # Features
//!
//! - **Structural diffing**: declarations are matched by kind, name and
//!   signature at every nesting level, independent of dump order
//! - **Breaking change classification**: removals, signature changes and
//!   access narrowing are flagged
//! - **Library-set comparison**: added and removed library products
//! - **Parallel processing**: builds and per-target diffs run on Rayon
//!
//! # Example
//!
//! ```no_run
//! use sdkdiff_core::dump::{normalize, parse_dump};
//! use sdkdiff_core::analyzer::diff_dumps;
//!
//! let old = normalize("Core", &parse_dump(&std::fs::read_to_string("old.abi.json")?)?);
//! let new = normalize("Core", &parse_dump(&std::fs::read_to_string("new.abi.json")?)?);
//!
//! for change in diff_dumps(&old, &new) {
//!     println!("{}: {}", change.change_type, change.change_description);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod abi;
pub mod analyzer;
pub mod changes;
pub mod dump;
pub mod error;
pub mod library;
pub mod model;
pub mod pipeline;
pub mod ports;
pub mod report;
pub mod source;

pub use abi::{AbiGenerating, AbiGenerator, AbiGeneratorOutput, DumpLayout};
pub use analyzer::{diff_dumps, SdkDumpAnalyzer, SdkDumpAnalyzing};
pub use changes::{Change, ChangeMap, ChangeSummary, ChangeType, FieldChange};
pub use dump::{SdkDumpGenerating, SdkDumpGenerator};
pub use error::{Error, Result};
pub use library::{LibraryAnalyzer, LibraryAnalyzing};
pub use model::{AccessLevel, Attributes, DeclKind, Declaration, SdkDump};
pub use pipeline::{Pipeline, PipelineOutcome, PipelineStages};
pub use ports::{FileHandling, LocalFileHandler, PackageDescribing, ProjectBuilding};
pub use report::{JsonOutputGenerator, MarkdownOutputGenerator, OutputGenerating};
pub use source::ProjectSource;
