//! Markdown report, suitable for pull request comments.

use super::OutputGenerating;
use crate::changes::{Change, ChangeMap, ChangeSummary, ChangeType, LIBRARY_CHANGES_KEY};
use crate::error::Result;
use crate::source::ProjectSource;

/// Section headings in render order.
const SECTIONS: [(ChangeType, &str); 3] = [
    (ChangeType::Addition, "#### ❇️ Added"),
    (ChangeType::Modification, "#### 🔀 Modified"),
    (ChangeType::Removal, "#### 😶‍🌫️ Removed"),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownOutputGenerator;

impl MarkdownOutputGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl OutputGenerating for MarkdownOutputGenerator {
    fn generate(
        &self,
        changes: &ChangeMap,
        all_targets: &[String],
        old_source: &ProjectSource,
        new_source: &ProjectSource,
    ) -> Result<String> {
        let summary = ChangeSummary::from_map(changes);
        let mut lines = Vec::new();

        lines.push(title(summary.total()));
        lines.push(String::new());
        lines.push(format!("_Comparing `{}` to `{}`_", new_source, old_source));
        lines.push(String::new());
        if summary.breaking_changes > 0 {
            lines.push(format!(
                "**⚠️ {} breaking {}**",
                summary.breaking_changes,
                plural(summary.breaking_changes, "change", "changes")
            ));
            lines.push(String::new());
        }

        if let Some(library_changes) = changes.get(LIBRARY_CHANGES_KEY) {
            lines.push("---".to_string());
            lines.push(String::new());
            lines.push("## 📚 Libraries".to_string());
            lines.push(String::new());
            render_changes(library_changes, &mut lines);
        }

        for target in all_targets {
            lines.push("---".to_string());
            lines.push(String::new());
            lines.push(format!("## `{}`", target));
            lines.push(String::new());
            match changes.get(target).filter(|c| !c.is_empty()) {
                Some(target_changes) => render_changes(target_changes, &mut lines),
                None => {
                    lines.push("_No changes_".to_string());
                    lines.push(String::new());
                }
            }
        }

        Ok(lines.join("\n"))
    }
}

fn title(total: u32) -> String {
    if total == 0 {
        "# ✅ No changes detected".to_string()
    } else {
        format!(
            "# 👀 {} public {} detected",
            total,
            plural(total, "change", "changes")
        )
    }
}

fn plural<'a>(count: u32, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 {
        one
    } else {
        many
    }
}

fn render_changes(changes: &[Change], lines: &mut Vec<String>) {
    for (change_type, heading) in SECTIONS {
        let mut section = changes
            .iter()
            .filter(|c| c.change_type == change_type)
            .peekable();
        if section.peek().is_none() {
            continue;
        }

        lines.push(heading.to_string());
        for change in section {
            lines.push(bullet(change));
        }
        lines.push(String::new());
    }
}

fn bullet(change: &Change) -> String {
    let marker = if change.is_breaking() { " ⚠️" } else { "" };
    if change.parent_name.is_empty() {
        format!("- {}{}", change.change_description, marker)
    } else {
        format!(
            "- `{}`: {}{}",
            change.parent_name, change.change_description, marker
        )
    }
}
