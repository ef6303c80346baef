//! Markdown reporter for GitHub-flavored Markdown output
//!
//! Suitable for pull request comments and CI job summaries.

use crate::models::{AnalysisResult, Finding, Severity};
use crate::scoring::grade;
use anyhow::Result;

/// Maximum findings to show per severity level
const MAX_FINDINGS_PER_SEVERITY: usize = 20;

pub fn render(result: &AnalysisResult) -> Result<String> {
    let mut md = String::new();

    md.push_str(&render_header(result));
    md.push('\n');
    md.push_str(&render_summary(result));
    md.push('\n');
    if let Some(section) = render_categories(result) {
        md.push_str(&section);
        md.push('\n');
    }
    md.push_str(&render_findings(result));
    md.push_str(&render_footer(result));

    Ok(md)
}

fn render_header(result: &AnalysisResult) -> String {
    format!(
        r#"# pulsecheck report: {}

**Grade: {}** | **Health score: {:.1}/10** | Framework: {} | Platform: {}

Generated: {}
"#,
        result.project.project_name,
        grade(result.health_score),
        result.health_score,
        result.project.framework,
        result.platform,
        result.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    )
}

fn render_summary(result: &AnalysisResult) -> String {
    let counts = result
        .metrics
        .as_ref()
        .map(|m| m.by_severity)
        .unwrap_or_else(|| crate::models::SeverityCounts::from_findings(&result.findings));

    let mut out = format!(
        r#"## Summary

{}

| Severity | Count |
|----------|-------|
| Error | {} |
| Warning | {} |
| Info | {} |
| **Total** | **{}** |
"#,
        result.summary, counts.error, counts.warning, counts.info, counts.total
    );
    if result.ai_enhanced {
        if let Some(model) = &result.ai_model {
            out.push_str(&format!("\n_Summary and suggestions written by {}._\n", model));
        }
    } else if let Some(err) = &result.ai_error {
        out.push_str(&format!("\n> AI enhancement unavailable: {}\n", err));
    }
    out
}

fn render_categories(result: &AnalysisResult) -> Option<String> {
    let metrics = result.metrics.as_ref()?;
    if metrics.by_category.is_empty() {
        return None;
    }
    let mut out = String::from("## Categories\n\n| Category | Findings |\n|----------|----------|\n");
    for (category, count) in &metrics.by_category {
        out.push_str(&format!("| {} | {} |\n", category, count));
    }
    Some(out)
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

fn render_findings(result: &AnalysisResult) -> String {
    if result.findings.is_empty() {
        return "## Findings\n\nNo issues found.\n\n".to_string();
    }

    let mut out = String::from("## Findings\n\n");
    for severity in [Severity::Error, Severity::Warning, Severity::Info] {
        let items: Vec<&Finding> = result
            .findings
            .iter()
            .filter(|f| f.severity == severity)
            .collect();
        if items.is_empty() {
            continue;
        }
        out.push_str(&format!("### {} ({})\n\n", title_case(severity), items.len()));
        out.push_str("| Location | Rule | Message | Suggestion |\n");
        out.push_str("|----------|------|---------|------------|\n");
        for f in items.iter().take(MAX_FINDINGS_PER_SEVERITY) {
            out.push_str(&format!(
                "| `{}:{}:{}` | `{}` | {} | {} |\n",
                f.file.display(),
                f.line,
                f.column,
                f.rule_id,
                escape_cell(&f.message),
                f.suggestion.as_deref().map(escape_cell).unwrap_or_default()
            ));
        }
        if items.len() > MAX_FINDINGS_PER_SEVERITY {
            out.push_str(&format!(
                "\n_...and {} more_\n",
                items.len() - MAX_FINDINGS_PER_SEVERITY
            ));
        }
        out.push('\n');
    }
    out
}

fn title_case(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "Errors",
        Severity::Warning => "Warnings",
        Severity::Info => "Info",
    }
}

fn render_footer(result: &AnalysisResult) -> String {
    let mut out = String::from("---\n\n");
    if !result.diagnostics.is_empty() {
        out.push_str(&format!(
            "<details><summary>{} diagnostic(s)</summary>\n\n",
            result.diagnostics.len()
        ));
        for d in &result.diagnostics {
            match &d.file {
                Some(file) => out.push_str(&format!("- `{}`: {}\n", file.display(), d.message)),
                None => out.push_str(&format!("- {}\n", d.message)),
            }
        }
        out.push_str("\n</details>\n\n");
    }
    out.push_str(&format!(
        "_Generated by pulsecheck {}_\n",
        env!("CARGO_PKG_VERSION")
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Diagnostic;
    use crate::reporters::tests::test_result;

    #[test]
    fn test_markdown_sections() {
        let md = render(&test_result()).unwrap();
        assert!(md.starts_with("# pulsecheck report: shop"));
        assert!(md.contains("**Health score: 7.0/10**"));
        assert!(md.contains("### Errors (1)"));
        assert!(md.contains("### Warnings (1)"));
        assert!(!md.contains("### Info"));
        assert!(md.contains("| correctness | 1 |"));
        assert!(md.contains("Generated: 2026-01-02 03:04:05 UTC"));
    }

    #[test]
    fn test_pipes_are_escaped() {
        let mut result = test_result();
        result.findings[0].message = "a || b".into();
        let md = render(&result).unwrap();
        assert!(md.contains("a \\|\\| b"));
    }

    #[test]
    fn test_diagnostics_listed() {
        let mut result = test_result();
        result.diagnostics.push(Diagnostic::for_file("src/x.ts", "parse failed"));
        let md = render(&result).unwrap();
        assert!(md.contains("1 diagnostic(s)"));
        assert!(md.contains("- `src/x.ts`: parse failed"));
    }
}
