//! JSON report: the machine-readable change map.

use super::OutputGenerating;
use crate::changes::ChangeMap;
use crate::error::{Error, Result};
use crate::source::ProjectSource;

/// Renders `{ target: [ { changeType, parentName, changeDescription } ] }`.
#[derive(Debug, Clone, Copy)]
pub struct JsonOutputGenerator {
    pub pretty: bool,
}

impl Default for JsonOutputGenerator {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl OutputGenerating for JsonOutputGenerator {
    fn generate(
        &self,
        changes: &ChangeMap,
        _all_targets: &[String],
        _old_source: &ProjectSource,
        _new_source: &ProjectSource,
    ) -> Result<String> {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(changes)
        } else {
            serde_json::to_string(changes)
        };
        rendered.map_err(|e| Error::Output {
            message: e.to_string(),
        })
    }
}
