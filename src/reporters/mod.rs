//! Output reporters for pulsecheck analysis results
//!
//! Supports multiple output formats:
//! - `table` - Terminal output with colors
//! - `json` - Machine-readable JSON (the full `AnalysisResult`)
//! - `markdown` - GitHub-flavored Markdown
//!
//! Reporters only read fields of [`AnalysisResult`].

mod json;
mod markdown;
mod text;

use crate::models::AnalysisResult;
use anyhow::{anyhow, Result};
use std::str::FromStr;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Markdown,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" | "text" | "terminal" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(anyhow!(
                "Unknown format '{}'. Valid formats: table, json, markdown",
                s
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

/// Render an analysis result in the given format
pub fn report_with_format(result: &AnalysisResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => text::render(result),
        OutputFormat::Json => json::render(result),
        OutputFormat::Markdown => markdown::render(result),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{Finding, Platform, ProjectInfo, Severity};
    use crate::scoring;
    use chrono::{TimeZone, Utc};

    /// A small result with one error and one warning
    pub(crate) fn test_result() -> AnalysisResult {
        let findings = vec![
            Finding {
                rule_id: "react-missing-key".into(),
                message: "Element rendered inside .map() has no key prop".into(),
                severity: Severity::Error,
                file: "src/List.tsx".into(),
                line: 7,
                column: 22,
                suggestion: Some("Add a stable key".into()),
                category: Some("correctness".into()),
            },
            Finding {
                rule_id: "no-explicit-any".into(),
                message: "Avoid the any type".into(),
                severity: Severity::Warning,
                file: "src/List.tsx".into(),
                line: 2,
                column: 10,
                suggestion: None,
                category: Some("type-safety".into()),
            },
        ];
        let score = scoring::score(&findings);
        AnalysisResult {
            platform: Platform::React,
            timestamp: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
            project: ProjectInfo {
                project_name: "shop".into(),
                framework: "React".into(),
                ..ProjectInfo::default()
            },
            metrics: Some(scoring::breakdown(&findings, 1)),
            summary: scoring::summarize(&findings, 1, score),
            findings,
            health_score: score,
            ai_enhanced: false,
            ai_model: None,
            ai_error: None,
            diagnostics: Vec::new(),
        }
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(OutputFormat::from_str("table").unwrap(), OutputFormat::Table);
        assert_eq!(OutputFormat::from_str("text").unwrap(), OutputFormat::Table);
        assert_eq!(OutputFormat::from_str("JSON").unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str("md").unwrap(), OutputFormat::Markdown);
        assert!(OutputFormat::from_str("sarif").is_err());
    }

    #[test]
    fn test_every_format_renders() {
        let result = test_result();
        for format in [OutputFormat::Table, OutputFormat::Json, OutputFormat::Markdown] {
            let out = report_with_format(&result, format).unwrap();
            assert!(out.contains("react-missing-key"), "{} output", format);
        }
    }
}
