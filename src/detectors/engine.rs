//! Rule evaluation engine with parallel support
//!
//! The RuleEngine turns files into findings:
//! - Runs files in parallel on a dedicated rayon pool
//! - Runs the enabled matchers for one file in parallel
//! - Isolates every matcher: an error or panic becomes a diagnostic
//! - Checks a cancel flag between files
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                      RuleEngine                         │
//! ├─────────────────────────────────────────────────────────┤
//! │  1. Read file (errors -> diagnostic)                    │
//! │  2. Mask comments/strings, parse best-effort tree       │
//! │  3. Run enabled matchers in parallel (catch_unwind)     │
//! │  4. Stamp effective severity + category                 │
//! │  5. Sort by (file, line, column, rule)                  │
//! └─────────────────────────────────────────────────────────┘
//! ```

use crate::config::resolver::AnalyzerConfig;
use crate::detectors::base::{mask_comments_and_strings, FileContext, Hit, Matcher};
use crate::detectors::catalog;
use crate::detectors::default_matchers;
use crate::detectors::syntax::{SourceLanguage, SyntaxTree};
use crate::files::FileSource;
use crate::models::{Diagnostic, Finding};
use crate::scoring::sort_findings;
use anyhow::Result;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Progress callback: (file just finished, files done, total files)
pub type ProgressCallback = Box<dyn Fn(&Path, usize, usize) + Send + Sync>;

/// Findings and diagnostics for one file
#[derive(Debug, Clone, Default)]
pub struct FileEvaluation {
    pub findings: Vec<Finding>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Output of a whole run
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    pub findings: Vec<Finding>,
    pub diagnostics: Vec<Diagnostic>,
    pub files_analyzed: usize,
    /// Files never started because the run was cancelled
    pub files_skipped: usize,
}

enum FileOutcome {
    Evaluated(FileEvaluation),
    Unreadable(Diagnostic),
    Skipped,
}

/// Runs matchers over files
pub struct RuleEngine {
    matchers: Vec<Arc<dyn Matcher>>,
    /// Number of worker threads for parallel execution
    workers: usize,
    cancel: Option<Arc<AtomicBool>>,
    progress_callback: Option<ProgressCallback>,
}

impl RuleEngine {
    /// Create an engine with the built-in matchers
    ///
    /// # Arguments
    /// * `workers` - Number of worker threads (0 = auto-detect)
    pub fn new(workers: usize) -> Self {
        let actual_workers = if workers == 0 {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
                .min(16)
        } else {
            workers
        };

        Self {
            matchers: default_matchers(),
            workers: actual_workers,
            cancel: None,
            progress_callback: None,
        }
    }

    /// Replace the matcher set
    pub fn with_matchers(mut self, matchers: Vec<Arc<dyn Matcher>>) -> Self {
        self.matchers = matchers;
        self
    }

    /// Files not yet started when `flag` becomes true are skipped
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Findings for one file's content
    pub fn evaluate(&self, content: &str, path: &Path, config: &AnalyzerConfig) -> Vec<Finding> {
        self.evaluate_file(content, path, config).findings
    }

    /// Findings plus diagnostics for one file's content
    pub fn evaluate_file(&self, content: &str, path: &Path, config: &AnalyzerConfig) -> FileEvaluation {
        let active: Vec<&Arc<dyn Matcher>> = self
            .matchers
            .iter()
            .filter(|m| config.is_enabled(m.rule_id()) && m.applies_to(path))
            .collect();

        let mut evaluation = FileEvaluation::default();
        if active.is_empty() {
            return evaluation;
        }

        let masked = mask_comments_and_strings(content);
        let syntax = match SourceLanguage::from_path(path) {
            Some(lang) => match SyntaxTree::parse(content, lang) {
                Ok(tree) => Some(tree),
                Err(e) => {
                    debug!("No syntax tree for {}: {}", path.display(), e);
                    evaluation.diagnostics.push(Diagnostic::for_file(
                        path,
                        format!("{}; falling back to text heuristics", e),
                    ));
                    None
                }
            },
            None => None,
        };

        let outcomes: Vec<(Vec<Finding>, Option<Diagnostic>)> = active
            .par_iter()
            .map(|matcher| {
                let ctx = FileContext {
                    path,
                    content,
                    masked: &masked,
                    syntax: syntax.as_ref(),
                    options: config.options_for(matcher.rule_id()),
                };
                self.run_single_matcher(matcher, &ctx, config)
            })
            .collect();

        for (findings, diagnostic) in outcomes {
            evaluation.findings.extend(findings);
            evaluation.diagnostics.extend(diagnostic);
        }
        sort_findings(&mut evaluation.findings);
        evaluation
    }

    fn run_single_matcher(
        &self,
        matcher: &Arc<dyn Matcher>,
        ctx: &FileContext<'_>,
        config: &AnalyzerConfig,
    ) -> (Vec<Finding>, Option<Diagnostic>) {
        let rule_id = matcher.rule_id();

        // Wrap in catch_unwind to handle panics
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| matcher.check(ctx)));

        match result {
            Ok(Ok(hits)) => (to_findings(rule_id, hits, ctx.path, config), None),
            Ok(Err(e)) => {
                warn!("Rule {} failed on {}: {}", rule_id, ctx.path.display(), e);
                (
                    Vec::new(),
                    Some(
                        Diagnostic::for_file(ctx.path, format!("rule failed: {}", e))
                            .with_rule(rule_id),
                    ),
                )
            }
            Err(panic_info) => {
                let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                error!("Rule {} panicked on {}: {}", rule_id, ctx.path.display(), panic_msg);
                (
                    Vec::new(),
                    Some(
                        Diagnostic::for_file(ctx.path, format!("rule panicked: {}", panic_msg))
                            .with_rule(rule_id),
                    ),
                )
            }
        }
    }

    /// Evaluate every file in `files`
    pub fn run(&self, files: &dyn FileSource, config: &AnalyzerConfig) -> Result<Evaluation> {
        let start = Instant::now();
        let paths = files.paths();
        let total = paths.len();
        let completed = AtomicUsize::new(0);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()?;

        let outcomes: Vec<(PathBuf, FileOutcome)> = pool.install(|| {
            paths
                .par_iter()
                .map(|path| {
                    if self.is_cancelled() {
                        return (path.clone(), FileOutcome::Skipped);
                    }
                    let outcome = match files.read(path) {
                        Ok(content) => {
                            FileOutcome::Evaluated(self.evaluate_file(&content, path, config))
                        }
                        Err(e) => {
                            warn!("Skipping unreadable file {}: {}", path.display(), e);
                            FileOutcome::Unreadable(Diagnostic::for_file(path, e.to_string()))
                        }
                    };

                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    if let Some(ref callback) = self.progress_callback {
                        callback(path, done, total);
                    }
                    (path.clone(), outcome)
                })
                .collect()
        });

        let mut evaluation = Evaluation::default();
        for (_, outcome) in outcomes {
            match outcome {
                FileOutcome::Evaluated(file) => {
                    evaluation.files_analyzed += 1;
                    evaluation.findings.extend(file.findings);
                    evaluation.diagnostics.extend(file.diagnostics);
                }
                FileOutcome::Unreadable(diagnostic) => evaluation.diagnostics.push(diagnostic),
                FileOutcome::Skipped => evaluation.files_skipped += 1,
            }
        }

        if evaluation.files_skipped > 0 {
            info!("Analysis cancelled; {} files skipped", evaluation.files_skipped);
            evaluation.diagnostics.push(Diagnostic::new(format!(
                "analysis cancelled; {} of {} files skipped",
                evaluation.files_skipped, total
            )));
        }

        sort_findings(&mut evaluation.findings);
        debug!(
            "Evaluated {} files in {}ms: {} findings, {} diagnostics",
            evaluation.files_analyzed,
            start.elapsed().as_millis(),
            evaluation.findings.len(),
            evaluation.diagnostics.len()
        );
        Ok(evaluation)
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Attach effective severity and category; drop hits from rules the catalog
/// does not know
fn to_findings(rule_id: &str, hits: Vec<Hit>, path: &Path, config: &AnalyzerConfig) -> Vec<Finding> {
    if hits.is_empty() {
        return Vec::new();
    }
    let Some(rule) = catalog::lookup(rule_id) else {
        warn!(
            "Dropping {} findings from unknown rule '{}' in {}",
            hits.len(),
            rule_id,
            path.display()
        );
        return Vec::new();
    };
    let severity = config.severity_for(rule.id).unwrap_or(rule.default_severity);

    hits.into_iter()
        .map(|hit| Finding {
            rule_id: rule.id.to_string(),
            message: hit.message,
            severity,
            file: path.to_path_buf(),
            line: hit.line.max(1),
            column: hit.column.max(1),
            suggestion: hit.suggestion,
            category: Some(rule.category.to_string()),
        })
        .collect()
}
