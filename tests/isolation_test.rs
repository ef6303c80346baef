//! A broken rule must cost only its own findings
//!
//! Swaps one built-in matcher for a failing one and checks that every other
//! rule still reports on every file.

use anyhow::bail;
use pulsecheck::detectors::catalog::{LOOSE_EQUALITY, NO_VAR};
use pulsecheck::detectors::{default_matchers, FileContext, Hit, Matcher};
use pulsecheck::files::InMemoryFiles;
use pulsecheck::models::{AnalysisResult, Platform, ProjectInfo};
use pulsecheck::pipeline::{analyze_files, AnalysisOptions};
use std::sync::Arc;

struct PanickingVar;

impl Matcher for PanickingVar {
    fn rule_id(&self) -> &'static str {
        NO_VAR
    }

    fn check(&self, _ctx: &FileContext<'_>) -> anyhow::Result<Vec<Hit>> {
        panic!("matcher exploded");
    }
}

struct FailingVar;

impl Matcher for FailingVar {
    fn rule_id(&self) -> &'static str {
        NO_VAR
    }

    fn check(&self, ctx: &FileContext<'_>) -> anyhow::Result<Vec<Hit>> {
        bail!("cannot read {}", ctx.path.display())
    }
}

fn files() -> InMemoryFiles {
    InMemoryFiles::new([
        ("a.js", "var x = 1;\nif (a == b) {}\n"),
        ("c.js", "var y = 2;\nif (c == d) {}\n"),
    ])
}

fn run_with(replacement: Arc<dyn Matcher>) -> AnalysisResult {
    let mut matchers: Vec<Arc<dyn Matcher>> = default_matchers()
        .into_iter()
        .filter(|m| m.rule_id() != NO_VAR)
        .collect();
    matchers.push(replacement);

    let options = AnalysisOptions::default().with_workers(2);
    let engine = options.engine().with_matchers(matchers);
    analyze_files(
        &files(),
        ProjectInfo::default(),
        Platform::Generic,
        &options,
        &engine,
    )
    .unwrap()
}

#[test]
fn panicking_rule_is_isolated() {
    let result = run_with(Arc::new(PanickingVar));

    let loose: Vec<_> = result
        .findings
        .iter()
        .filter(|f| f.rule_id == LOOSE_EQUALITY)
        .map(|f| f.file.display().to_string())
        .collect();
    assert_eq!(loose, vec!["a.js", "c.js"]);
    assert!(result.findings.iter().all(|f| f.rule_id != NO_VAR));

    let panics: Vec<_> = result
        .diagnostics
        .iter()
        .filter(|d| d.message.contains("rule panicked"))
        .collect();
    assert_eq!(panics.len(), 2, "{:#?}", result.diagnostics);
    assert!(panics.iter().all(|d| d.rule_id.as_deref() == Some(NO_VAR)));
    assert!(panics[0].message.contains("matcher exploded"));

    // two loose-equality warnings
    assert_eq!(result.health_score, 8.0);
    assert_eq!(result.metrics.unwrap().files_analyzed, 2);
}

#[test]
fn failing_rule_is_isolated() {
    let result = run_with(Arc::new(FailingVar));

    assert_eq!(
        result
            .findings
            .iter()
            .filter(|f| f.rule_id == LOOSE_EQUALITY)
            .count(),
        2
    );
    let failures: Vec<_> = result
        .diagnostics
        .iter()
        .filter(|d| d.message.starts_with("rule failed"))
        .collect();
    assert_eq!(failures.len(), 2, "{:#?}", result.diagnostics);
    assert!(failures.iter().any(|d| d.message.contains("cannot read a.js")));
}

#[test]
fn unreadable_file_does_not_stop_the_run() {
    let files = files().with_unreadable("broken.js");
    let options = AnalysisOptions::default();
    let result = analyze_files(
        &files,
        ProjectInfo::default(),
        Platform::Generic,
        &options,
        &options.engine(),
    )
    .unwrap();

    // var + loose equality on each readable file
    assert_eq!(result.findings.len(), 4);
    assert_eq!(result.metrics.unwrap().files_analyzed, 2);
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.file.as_deref() == Some(std::path::Path::new("broken.js"))));
}

#[test]
fn deeply_nested_file_does_not_abort_the_run() {
    let depth = 100_000;
    let deep = format!("const a = {}1{};\n", "[".repeat(depth), "]".repeat(depth));
    let files = InMemoryFiles::new([("deep.js", deep), ("ok.js", "var x = 1;\n".to_string())]);
    let options = AnalysisOptions::default().with_workers(2);
    let result = analyze_files(
        &files,
        ProjectInfo::default(),
        Platform::Generic,
        &options,
        &options.engine(),
    )
    .unwrap();

    assert_eq!(result.metrics.unwrap().files_analyzed, 2);
    let flagged: Vec<_> = result
        .findings
        .iter()
        .map(|f| (f.file.display().to_string(), f.rule_id.as_str()))
        .collect();
    assert_eq!(flagged, vec![("ok.js".to_string(), NO_VAR)]);
}
