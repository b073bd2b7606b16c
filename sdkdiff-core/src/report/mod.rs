//! Report rendering.
//!
//! Generators are pure formatters and never filter entries. Human-readable
//! reports split a target's changes into added, modified and removed
//! sections; inside a section entries keep the order they were received in.

pub mod json;
pub mod markdown;

use crate::changes::ChangeMap;
use crate::error::Result;
use crate::source::ProjectSource;

pub use json::JsonOutputGenerator;
pub use markdown::MarkdownOutputGenerator;

/// Renders a change map into a report.
pub trait OutputGenerating: Send + Sync {
    fn generate(
        &self,
        changes: &ChangeMap,
        all_targets: &[String],
        old_source: &ProjectSource,
        new_source: &ProjectSource,
    ) -> Result<String>;
}
