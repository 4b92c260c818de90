//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use nexus_domain::TestCase;
use nexus_extractor::{FragmentFailure, MatrixResult, StoryResult};
use std::path::PathBuf;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Longest title shown in the summary table
const TITLE_WIDTH: usize = 60;

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format a generated matrix and the files written for it.
    pub fn format_matrix(&self, result: &MatrixResult, files: &[PathBuf]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let value = serde_json::json!({
                    "status": "success",
                    "model": result.model_name,
                    "counts": result.counts,
                    "records": result.records,
                    "failures": failures_json(&result.failures),
                    "files": files,
                });
                Ok(serde_json::to_string_pretty(&value)?)
            }
            OutputFormat::Table => {
                let mut out = self.records_table(&result.records);
                out.push('\n');
                out.push_str(&self.success(&format!(
                    "{} test case(s): {} functional, {} non-functional ({} fragment(s), model {})",
                    result.counts.total,
                    result.counts.functional,
                    result.counts.non_functional,
                    result.counts.fragments,
                    result.model_name
                )));
                self.push_failures(&mut out, &result.failures);
                self.push_files(&mut out, files);
                Ok(out)
            }
            OutputFormat::Quiet => Ok(quiet_files(files)),
        }
    }

    /// Format generated stories and the file written for them.
    pub fn format_stories(&self, result: &StoryResult, files: &[PathBuf]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let value = serde_json::json!({
                    "status": "success",
                    "model": result.model_name,
                    "stories": result.stories,
                    "failures": failures_json(&result.failures),
                    "files": files,
                });
                Ok(serde_json::to_string_pretty(&value)?)
            }
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["#", "Story"]);
                for (i, story) in result.stories.iter().enumerate() {
                    let headline = story.lines().next().unwrap_or_default();
                    builder.push_record([(i + 1).to_string(), truncate(headline, TITLE_WIDTH)]);
                }
                let mut out = self.styled(builder);
                out.push('\n');
                out.push_str(&self.success(&format!(
                    "{} story(ies) generated (model {})",
                    result.stories.len(),
                    result.model_name
                )));
                self.push_failures(&mut out, &result.failures);
                self.push_files(&mut out, files);
                Ok(out)
            }
            OutputFormat::Quiet => Ok(quiet_files(files)),
        }
    }

    fn records_table(&self, records: &[TestCase]) -> String {
        if records.is_empty() {
            return self.colorize("No test cases generated.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["ID", "Title", "Kind", "Category", "Priority", "Story"]);
        for record in records {
            builder.push_record([
                record.id.clone(),
                truncate(&record.title, TITLE_WIDTH),
                record.kind.label().to_string(),
                record.category.label().to_string(),
                record.priority.label().to_string(),
                truncate(&record.source_story, 30),
            ]);
        }
        self.styled(builder)
    }

    fn styled(&self, builder: Builder) -> String {
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    fn push_failures(&self, out: &mut String, failures: &[FragmentFailure]) {
        for failure in failures {
            out.push('\n');
            out.push_str(&self.warning(&format!(
                "Fragment {}/{} ({}) skipped: {}",
                failure.index + 1,
                failure.total,
                failure.label,
                failure.error
            )));
        }
    }

    fn push_files(&self, out: &mut String, files: &[PathBuf]) {
        for file in files {
            out.push('\n');
            out.push_str(&self.info(&format!("Wrote {}", file.display())));
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn failures_json(failures: &[FragmentFailure]) -> serde_json::Value {
    failures
        .iter()
        .map(|f| {
            serde_json::json!({
                "fragment": f.index + 1,
                "total": f.total,
                "story": f.label,
                "error": f.error.to_string(),
            })
        })
        .collect()
}

fn quiet_files(files: &[PathBuf]) -> String {
    files
        .iter()
        .map(|f| f.display().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Cut to `max` characters, marking the cut with "..."
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}
