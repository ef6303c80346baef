//! Analysis pipeline
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌────────────┐   ┌─────────┐   ┌────────────────┐
//! │ discover │ → │ resolve  │ → │ RuleEngine │ → │ scoring │ → │ AnalysisResult │
//! │  files   │   │  config  │   │   (rayon)  │   │         │   │                │
//! └──────────┘   └──────────┘   └────────────┘   └─────────┘   └────────────────┘
//! ```
//!
//! Only a missing project root is an error. Everything else that goes wrong
//! ends up in `AnalysisResult::diagnostics`.

use crate::config::resolver::{resolve, Overrides};
use crate::detectors::RuleEngine;
use crate::files::{FileSource, WalkedFiles};
use crate::models::{AnalysisResult, Diagnostic, Platform, ProjectInfo};
use crate::project::load_project_info;
use crate::scoring;
use anyhow::{Context, Result};
use chrono::Utc;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};

/// Inputs for one analysis run
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pub preset: String,
    pub overrides: Overrides,
    /// 0 = auto
    pub workers: usize,
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            preset: "recommended".to_string(),
            overrides: Overrides::default(),
            workers: 0,
            cancel: None,
        }
    }
}

impl AnalysisOptions {
    pub fn with_preset(mut self, preset: impl Into<String>) -> Self {
        self.preset = preset.into();
        self
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Engine configured from these options, with the built-in matchers
    pub fn engine(&self) -> RuleEngine {
        let engine = RuleEngine::new(self.workers);
        match &self.cancel {
            Some(flag) => engine.with_cancel_flag(Arc::clone(flag)),
            None => engine,
        }
    }
}

/// Analyze the project at `root` with the built-in matchers
pub fn analyze_project(root: &Path, options: &AnalysisOptions) -> Result<AnalysisResult> {
    analyze_project_with(root, options, &options.engine())
}

/// Analyze the project at `root` with a caller-supplied engine
pub fn analyze_project_with(
    root: &Path,
    options: &AnalysisOptions,
    engine: &RuleEngine,
) -> Result<AnalysisResult> {
    let files = WalkedFiles::discover(root)?;
    let (project, platform) = load_project_info(root);
    info!(
        "Analyzing {} files in {} ({})",
        files.paths().len(),
        project.project_name,
        project.framework
    );
    analyze_files(&files, project, platform, options, engine)
}

/// Analyze files from any source
pub fn analyze_files(
    files: &dyn FileSource,
    project: ProjectInfo,
    platform: Platform,
    options: &AnalysisOptions,
    engine: &RuleEngine,
) -> Result<AnalysisResult> {
    let resolved = resolve(&options.preset, &options.overrides);
    let mut diagnostics: Vec<Diagnostic> = resolved
        .warnings
        .iter()
        .map(|w| Diagnostic::new(format!("config: {}", w)))
        .collect();

    let evaluation = engine
        .run(files, &resolved.config)
        .context("Failed to run rule engine")?;
    if !evaluation.diagnostics.is_empty() {
        warn!(
            "{} problems absorbed during analysis",
            evaluation.diagnostics.len()
        );
    }
    diagnostics.extend(evaluation.diagnostics);

    let findings = evaluation.findings;
    let health_score = scoring::score(&findings);
    let metrics = scoring::breakdown(&findings, evaluation.files_analyzed);
    let summary = scoring::summarize(&findings, evaluation.files_analyzed, health_score);

    Ok(AnalysisResult {
        platform,
        timestamp: Utc::now(),
        project,
        findings,
        health_score,
        summary,
        metrics: Some(metrics),
        ai_enhanced: false,
        ai_model: None,
        ai_error: None,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::InMemoryFiles;
    use crate::models::Severity;

    fn run(files: &InMemoryFiles, options: &AnalysisOptions) -> AnalysisResult {
        analyze_files(
            files,
            ProjectInfo::default(),
            Platform::Generic,
            options,
            &options.engine(),
        )
        .unwrap()
    }

    #[test]
    fn test_clean_project_scores_ten() {
        let files = InMemoryFiles::new([("a.ts", "export const a: number = 1;\n")]);
        let result = run(&files, &AnalysisOptions::default());
        assert!(result.findings.is_empty());
        assert_eq!(result.health_score, 10.0);
        assert_eq!(result.metrics.unwrap().files_analyzed, 1);
        assert!(result.summary.starts_with("No issues found across 1 file."));
    }

    #[test]
    fn test_unknown_preset_is_a_diagnostic() {
        let files = InMemoryFiles::new([("a.js", "var x = 1;\n")]);
        let options = AnalysisOptions::default().with_preset("paranoid");
        let result = run(&files, &options);
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.message.starts_with("config:") && d.message.contains("paranoid")));
        // fell back to recommended, where no-var is on
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].severity, Severity::Warning);
    }

    #[test]
    fn test_unreadable_file_does_not_abort() {
        let files = InMemoryFiles::new([("a.js", "var x = 1;\n")]).with_unreadable("b.js");
        let result = run(&files, &AnalysisOptions::default());
        assert_eq!(result.findings.len(), 1);
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.file.as_deref() == Some(Path::new("b.js"))));
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let err = analyze_project(
            Path::new("/definitely/not/here/pulsecheck"),
            &AnalysisOptions::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
