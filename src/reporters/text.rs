//! Text (terminal) reporter with colors and formatting

use crate::models::{AnalysisResult, Finding, Severity};
use crate::scoring::grade;
use anyhow::Result;

/// Grade colors (ANSI escape codes)
fn grade_color(grade: &str) -> &'static str {
    match grade {
        "A" => "\x1b[32m", // Green
        "B" => "\x1b[92m", // Light green
        "C" => "\x1b[33m", // Yellow
        "D" => "\x1b[91m", // Light red
        "F" => "\x1b[31m", // Red
        _ => "\x1b[0m",
    }
}

fn severity_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "\x1b[31m",
        Severity::Warning => "\x1b[33m",
        Severity::Info => "\x1b[90m",
    }
}

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

/// Findings listed before "...and N more"
const MAX_ROWS: usize = 25;

fn severity_tag(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "[E]",
        Severity::Warning => "[W]",
        Severity::Info => "[I]",
    }
}

/// Render result as formatted terminal output
pub fn render(result: &AnalysisResult) -> Result<String> {
    let mut out = String::new();
    let letter = grade(result.health_score);
    let grade_c = grade_color(letter);

    out.push_str(&format!(
        "\n{BOLD}pulsecheck{RESET}  {} {DIM}({}, {}){RESET}\n",
        result.project.project_name, result.project.framework, result.platform
    ));
    out.push_str(&format!(
        "{DIM}──────────────────────────────────────{RESET}\n"
    ));
    out.push_str(&format!(
        "Health: {BOLD}{:.1}/10{RESET}  Grade: {grade_c}{BOLD}{}{RESET}",
        result.health_score, letter
    ));
    if let Some(metrics) = &result.metrics {
        out.push_str(&format!("  Files: {}", metrics.files_analyzed));
    }
    out.push_str("\n\n");

    // Severity and category counts
    if let Some(metrics) = &result.metrics {
        let s = &metrics.by_severity;
        out.push_str(&format!("{BOLD}FINDINGS{RESET} ({} total)\n", s.total));
        let mut parts = Vec::new();
        if s.error > 0 {
            parts.push(format!("\x1b[31m{} error{RESET}", s.error));
        }
        if s.warning > 0 {
            parts.push(format!("\x1b[33m{} warning{RESET}", s.warning));
        }
        if s.info > 0 {
            parts.push(format!("\x1b[90m{} info{RESET}", s.info));
        }
        if !parts.is_empty() {
            out.push_str(&format!("  {}\n", parts.join(" | ")));
        }
        if !metrics.by_category.is_empty() {
            let cats: Vec<String> = metrics
                .by_category
                .iter()
                .map(|(c, n)| format!("{} {}", c, n))
                .collect();
            out.push_str(&format!("  {DIM}{}{RESET}\n", cats.join(" · ")));
        }
        out.push('\n');
    }

    if !result.findings.is_empty() {
        out.push_str(&format!(
            "{DIM}  SEV  LOCATION                      RULE                      MESSAGE{RESET}\n"
        ));
        out.push_str(&format!(
            "{DIM}  ─────────────────────────────────────────────────────────────────{RESET}\n"
        ));
        for finding in result.findings.iter().take(MAX_ROWS) {
            let sev_c = severity_color(finding.severity);
            out.push_str(&format!(
                "  {sev_c}{}{RESET}  {:<28}  {:<24}  {}\n",
                severity_tag(finding.severity),
                location(finding),
                finding.rule_id,
                finding.message
            ));
            if let Some(suggestion) = &finding.suggestion {
                out.push_str(&format!("  {DIM}     ↳ {}{RESET}\n", suggestion));
            }
        }
        let remaining = result.findings.len().saturating_sub(MAX_ROWS);
        if remaining > 0 {
            out.push_str(&format!(
                "\n  {DIM}...and {} more (use --format json for the full list){RESET}\n",
                remaining
            ));
        }
        out.push('\n');
    }

    out.push_str(&format!("{BOLD}SUMMARY{RESET}\n  {}\n", result.summary));

    if result.ai_enhanced {
        if let Some(model) = &result.ai_model {
            out.push_str(&format!("  {DIM}AI summary by {}{RESET}\n", model));
        }
    } else if let Some(err) = &result.ai_error {
        out.push_str(&format!("  \x1b[33mAI enhancement unavailable: {}{RESET}\n", err));
    }

    if !result.diagnostics.is_empty() {
        out.push_str(&format!(
            "\n{DIM}{} diagnostic(s) recorded; rerun with --log-level debug for details{RESET}\n",
            result.diagnostics.len()
        ));
    }

    Ok(out)
}

/// `file:line:col`, shortened from the left to fit the column
fn location(finding: &Finding) -> String {
    let loc = format!(
        "{}:{}:{}",
        finding.file.display(),
        finding.line,
        finding.column
    );
    let count = loc.chars().count();
    if count > 28 {
        format!("...{}", loc.chars().skip(count - 25).collect::<String>())
    } else {
        loc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporters::tests::test_result;

    #[test]
    fn test_text_render() {
        let out = render(&test_result()).unwrap();
        assert!(out.contains("7.0/10"));
        assert!(out.contains("src/List.tsx:7:22"));
        assert!(out.contains("↳ Add a stable key"));
        assert!(out.contains("1 error"));
    }

    #[test]
    fn test_ai_error_is_shown() {
        let mut result = test_result();
        result.ai_error = Some("rate limited: slow down".into());
        let out = render(&result).unwrap();
        assert!(out.contains("AI enhancement unavailable: rate limited"));
    }

    #[test]
    fn test_long_location_is_shortened() {
        let mut result = test_result();
        result.findings[0].file = "src/features/checkout/components/CartSummary.tsx".into();
        let out = render(&result).unwrap();
        assert!(out.contains("...ents/CartSummary.tsx:7:22"));
        assert!(!out.contains("src/features"));
    }
}
