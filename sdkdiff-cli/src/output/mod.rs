//! Report format selection for the CLI.
//!
//! Markdown and JSON renderers live in `sdkdiff-core`; the terminal table
//! renderer lives here because it depends on `colored` and `tabled`.

use clap::ValueEnum;
use std::str::FromStr;

use sdkdiff_core::{JsonOutputGenerator, MarkdownOutputGenerator, OutputGenerating};

mod table;

pub use self::table::TableOutputGenerator;

/// Report format for CLI results
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Markdown report for pull request comments (default)
    #[default]
    Markdown,
    /// JSON change map for machine consumption
    Json,
    /// Colored terminal listing with a summary table
    Table,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "json" => Ok(OutputFormat::Json),
            "table" => Ok(OutputFormat::Table),
            _ => Err(format!("Unknown output format: '{}'", s)),
        }
    }
}

impl OutputFormat {
    /// Renderer for this format.
    pub fn generator(self) -> Box<dyn OutputGenerating> {
        match self {
            OutputFormat::Markdown => Box::new(MarkdownOutputGenerator::new()),
            OutputFormat::Json => Box::new(JsonOutputGenerator::default()),
            OutputFormat::Table => Box::new(TableOutputGenerator::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(
            "markdown".parse::<OutputFormat>().unwrap(),
            OutputFormat::Markdown
        );
        assert_eq!("MD".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("Table".parse::<OutputFormat>().unwrap(), OutputFormat::Table);
        assert!("csv".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_default_is_markdown() {
        assert_eq!(OutputFormat::default(), OutputFormat::Markdown);
    }
}
