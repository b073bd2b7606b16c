//! Terminal report: colored change listing followed by a summary table.

use colored::Colorize;
use tabled::builder::Builder;
use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Modify, Style};

use sdkdiff_core::changes::LIBRARY_CHANGES_KEY;
use sdkdiff_core::{Change, ChangeMap, ChangeSummary, ChangeType, OutputGenerating, ProjectSource};

/// Row label used for library-set changes.
const LIBRARIES_LABEL: &str = "(libraries)";

#[derive(Debug, Clone, Copy, Default)]
pub struct TableOutputGenerator;

impl TableOutputGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl OutputGenerating for TableOutputGenerator {
    fn generate(
        &self,
        changes: &ChangeMap,
        all_targets: &[String],
        old_source: &ProjectSource,
        new_source: &ProjectSource,
    ) -> sdkdiff_core::Result<String> {
        let mut output = String::new();
        output.push_str(&format!(
            "{} {} {} {}\n\n",
            "Comparing".bold(),
            new_source.to_string().cyan(),
            "to".bold(),
            old_source.to_string().cyan()
        ));

        let mut sections: Vec<(&str, &[Change])> = Vec::new();
        if let Some(library_changes) = changes.get(LIBRARY_CHANGES_KEY) {
            sections.push((LIBRARIES_LABEL, library_changes.as_slice()));
        }
        for target in all_targets {
            let target_changes = changes.get(target).map(Vec::as_slice).unwrap_or(&[]);
            sections.push((target.as_str(), target_changes));
        }

        for (label, section_changes) in &sections {
            output.push_str(&format!("{}\n", label.bold().underline()));
            if section_changes.is_empty() {
                output.push_str(&format!("  {}\n\n", "No changes".dimmed()));
                continue;
            }
            render_group(&mut output, section_changes, ChangeType::Addition);
            render_group(&mut output, section_changes, ChangeType::Modification);
            render_group(&mut output, section_changes, ChangeType::Removal);
        }

        output.push_str(&summary_table(&sections));
        output.push('\n');

        let summary = ChangeSummary::from_map(changes);
        let total = summary.text();
        if summary.breaking_changes > 0 {
            output.push_str(&format!("{}\n", total.red().bold()));
        } else {
            output.push_str(&format!("{}\n", total.green()));
        }

        Ok(output)
    }
}

fn render_group(output: &mut String, changes: &[Change], change_type: ChangeType) {
    let group: Vec<&Change> = changes
        .iter()
        .filter(|c| c.change_type == change_type)
        .collect();
    if group.is_empty() {
        return;
    }

    let (heading, sigil) = match change_type {
        ChangeType::Addition => ("ADDED".green().bold(), "+".green()),
        ChangeType::Modification => ("MODIFIED".yellow().bold(), "~".yellow()),
        ChangeType::Removal => ("REMOVED".red().bold(), "-".red()),
    };
    output.push_str(&format!("  {} ({}):\n", heading, group.len()));

    for change in group {
        let location = if change.parent_name.is_empty() {
            String::new()
        } else {
            format!("{} ", format!("{}:", change.parent_name).dimmed())
        };
        let marker = if change.is_breaking() {
            format!(" {}", "[breaking]".red())
        } else {
            String::new()
        };
        output.push_str(&format!(
            "    {} {}{}{}\n",
            sigil, location, change.change_description, marker
        ));
    }
    output.push('\n');
}

fn summary_table(sections: &[(&str, &[Change])]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Target", "Added", "Modified", "Removed", "Breaking"]);

    for (label, section_changes) in sections {
        let mut summary = ChangeSummary::new();
        for change in section_changes.iter() {
            summary.record(change);
        }
        builder.push_record([
            label.to_string(),
            summary.additions.to_string(),
            summary.modifications.to_string(),
            summary.removals.to_string(),
            summary.breaking_changes.to_string(),
        ]);
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    table.with(Modify::new(Columns::new(1..)).with(Alignment::right()));
    table.to_string()
}
