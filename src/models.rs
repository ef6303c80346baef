//! Core data models for pulsecheck
//!
//! These types are the contract between the rule engine, the scorer, the
//! AI reconciler and the reporters. Everything here is a plain value:
//! later pipeline stages derive new values instead of mutating old ones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

/// Severity levels for findings
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Error,
}

impl Severity {
    /// Penalty subtracted from the health score for one finding at this level
    pub fn penalty(&self) -> f64 {
        match self {
            Severity::Error => 2.0,
            Severity::Warning => 1.0,
            Severity::Info => 0.5,
        }
    }

    /// One step stricter (info -> warning -> error)
    pub fn escalate(&self) -> Severity {
        match self {
            Severity::Info => Severity::Warning,
            Severity::Warning | Severity::Error => Severity::Error,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "error" | "err" => Ok(Severity::Error),
            "warning" | "warn" => Ok(Severity::Warning),
            "info" => Ok(Severity::Info),
            other => Err(format!(
                "unknown severity '{}'. Valid severities: error, warning, info",
                other
            )),
        }
    }
}

/// One rule violation at a specific location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub rule_id: String,
    pub message: String,
    pub severity: Severity,
    /// Path relative to the project root
    pub file: PathBuf,
    /// 1-indexed
    pub line: u32,
    /// 1-indexed, in characters
    pub column: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Finding {
    /// Copy of this finding carrying a different suggestion
    pub fn with_suggestion(&self, suggestion: impl Into<String>) -> Finding {
        Finding {
            suggestion: Some(suggestion.into()),
            ..self.clone()
        }
    }
}

/// Counts of findings by severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub error: usize,
    pub warning: usize,
    pub info: usize,
    pub total: usize,
}

impl SeverityCounts {
    pub fn from_findings(findings: &[Finding]) -> Self {
        let mut counts = Self::default();
        for f in findings {
            match f.severity {
                Severity::Error => counts.error += 1,
                Severity::Warning => counts.warning += 1,
                Severity::Info => counts.info += 1,
            }
            counts.total += 1;
        }
        counts
    }

    /// Number of findings at or above `threshold`
    pub fn at_or_above(&self, threshold: Severity) -> usize {
        match threshold {
            Severity::Error => self.error,
            Severity::Warning => self.error + self.warning,
            Severity::Info => self.total,
        }
    }
}

/// Severity and category breakdown attached to a report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub by_severity: SeverityCounts,
    /// Only findings whose rule is in the catalog are counted here
    pub by_category: BTreeMap<String, usize>,
    pub files_analyzed: usize,
}

/// Best-effort project metadata read from the manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInfo {
    pub project_name: String,
    pub framework: String,
    pub version: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub dev_dependencies: Vec<String>,
}

impl Default for ProjectInfo {
    fn default() -> Self {
        Self {
            project_name: "Unknown Project".to_string(),
            framework: "Unknown".to_string(),
            version: "0.0.0".to_string(),
            dependencies: Vec::new(),
            dev_dependencies: Vec::new(),
        }
    }
}

/// Platform tag for a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Platform {
    React,
    ReactNative,
    NextJs,
    Node,
    #[default]
    Generic,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::React => write!(f, "react"),
            Platform::ReactNative => write!(f, "react-native"),
            Platform::NextJs => write!(f, "next-js"),
            Platform::Node => write!(f, "node"),
            Platform::Generic => write!(f, "generic"),
        }
    }
}

/// A non-fatal problem absorbed during analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            file: None,
            rule_id: None,
            message: message.into(),
        }
    }

    pub fn for_file(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            file: Some(file.into()),
            rule_id: None,
            message: message.into(),
        }
    }

    pub fn with_rule(mut self, rule_id: impl Into<String>) -> Self {
        self.rule_id = Some(rule_id.into());
        self
    }
}

/// Top-level report for one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub platform: Platform,
    pub timestamp: DateTime<Utc>,
    pub project: ProjectInfo,
    pub findings: Vec<Finding>,
    pub health_score: f64,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Metrics>,
    #[serde(default)]
    pub ai_enhanced: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}
