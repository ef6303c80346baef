//! Health scoring
//!
//! # Scoring Formula
//!
//! ```text
//! penalty = 2.0 × errors + 1.0 × warnings + 0.5 × infos
//! score   = max(0, 10 − penalty), rounded to one decimal
//! ```
//!
//! The score depends only on the severity multiset of the findings, never on
//! which rule produced them or in what order they arrive.
//!
//! The category breakdown resolves categories through the rule catalog. A
//! finding whose rule id the catalog does not know is left out of the
//! category breakdown but still counts toward the severity totals.

use crate::detectors::catalog;
use crate::models::{Finding, Metrics, SeverityCounts};
use std::collections::BTreeMap;

pub const MAX_SCORE: f64 = 10.0;

/// Total severity-weighted penalty
pub fn penalty(findings: &[Finding]) -> f64 {
    findings.iter().map(|f| f.severity.penalty()).sum()
}

/// Health score in [0, 10]
pub fn score(findings: &[Finding]) -> f64 {
    let raw = (MAX_SCORE - penalty(findings)).max(0.0);
    (raw * 10.0).round() / 10.0
}

/// Letter grade for a 0-10 score
pub fn grade(score: f64) -> &'static str {
    match score {
        s if s >= 9.0 => "A",
        s if s >= 8.0 => "B",
        s if s >= 7.0 => "C",
        s if s >= 6.0 => "D",
        _ => "F",
    }
}

/// Findings grouped by catalog category. Unknown rule ids are excluded.
pub fn group_by_category(findings: &[Finding]) -> BTreeMap<&'static str, Vec<&Finding>> {
    let mut groups: BTreeMap<&'static str, Vec<&Finding>> = BTreeMap::new();
    for f in findings {
        if let Some(rule) = catalog::lookup(&f.rule_id) {
            groups.entry(rule.category).or_default().push(f);
        }
    }
    groups
}

/// Severity counts plus category breakdown
pub fn breakdown(findings: &[Finding], files_analyzed: usize) -> Metrics {
    let by_category = group_by_category(findings)
        .into_iter()
        .map(|(category, items)| (category.to_string(), items.len()))
        .collect();

    Metrics {
        by_severity: SeverityCounts::from_findings(findings),
        by_category,
        files_analyzed,
    }
}

/// Deterministic presentation order: file, line, column, then rule id
pub fn sort_findings(findings: &mut [Finding]) {
    findings.sort_by(|a, b| {
        a.file
            .cmp(&b.file)
            .then(a.line.cmp(&b.line))
            .then(a.column.cmp(&b.column))
            .then_with(|| a.rule_id.cmp(&b.rule_id))
    });
}

/// One-paragraph, rule-based summary used when no AI summary is available
pub fn summarize(findings: &[Finding], files_analyzed: usize, health_score: f64) -> String {
    let counts = SeverityCounts::from_findings(findings);
    let files = if files_analyzed == 1 { "file" } else { "files" };

    if counts.total == 0 {
        return format!(
            "No issues found across {} {}. Health score: {:.1}/10.",
            files_analyzed, files, health_score
        );
    }

    let issues = if counts.total == 1 { "issue" } else { "issues" };
    let mut summary = format!(
        "Found {} {} ({} errors, {} warnings, {} info) across {} {}. Health score: {:.1}/10.",
        counts.total, issues, counts.error, counts.warning, counts.info, files_analyzed, files, health_score
    );

    let groups = group_by_category(findings);
    if let Some((category, items)) = groups.iter().max_by(|a, b| {
        a.1.len().cmp(&b.1.len()).then_with(|| b.0.cmp(a.0))
    }) {
        summary.push_str(&format!(
            " Most findings are in {} ({}).",
            category,
            items.len()
        ));
    }
    summary
}
