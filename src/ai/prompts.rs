//! Prompt builders
//!
//! The report prompt shows findings grouped by rule. Occurrences shown per
//! rule and the number of rules are capped so large projects don't blow the
//! context window.

use crate::ai::truncate_chars;
use crate::models::{AnalysisResult, Finding};
use std::collections::BTreeMap;
use std::fmt::Write;

/// Occurrences listed per rule before "(and N more)"
pub const MAX_OCCURRENCES_PER_RULE: usize = 3;
/// Rules listed before the remainder is summarised as a count
pub const MAX_RULES: usize = 15;
/// Characters kept from each finding message
pub const MAX_MESSAGE_CHARS: usize = 200;

pub const SYSTEM_PROMPT: &str = "You are a senior frontend engineer reviewing static analysis \
results for a React/TypeScript project. Be concrete and brief. Answer with a single JSON object \
and nothing else.";

/// Findings grouped by rule id, largest group first (ties by id)
fn grouped(findings: &[Finding]) -> Vec<(&str, Vec<&Finding>)> {
    let mut groups: BTreeMap<&str, Vec<&Finding>> = BTreeMap::new();
    for f in findings {
        groups.entry(f.rule_id.as_str()).or_default().push(f);
    }
    let mut groups: Vec<_> = groups.into_iter().collect();
    groups.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then(a.0.cmp(b.0)));
    groups
}

pub fn report_prompt(result: &AnalysisResult) -> String {
    let project = &result.project;
    let mut prompt = String::new();

    let _ = writeln!(prompt, "## Project");
    let _ = writeln!(prompt, "- Name: {}", project.project_name);
    let _ = writeln!(prompt, "- Framework: {}", project.framework);
    let _ = writeln!(prompt, "- Version: {}", project.version);
    let _ = writeln!(prompt, "- Platform: {}", result.platform);
    if !project.dependencies.is_empty() {
        let deps: Vec<&str> = project.dependencies.iter().take(20).map(String::as_str).collect();
        let _ = writeln!(prompt, "- Dependencies: {}", deps.join(", "));
    }
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "## Health score: {:.1}/10", result.health_score);
    let _ = writeln!(prompt, "Total findings: {}", result.findings.len());
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "## Findings by rule");

    let groups = grouped(&result.findings);
    if groups.is_empty() {
        let _ = writeln!(prompt, "No findings.");
    }
    for (rule_id, items) in groups.iter().take(MAX_RULES) {
        let _ = writeln!(
            prompt,
            "### {} ({} occurrence{}, {})",
            rule_id,
            items.len(),
            if items.len() == 1 { "" } else { "s" },
            items[0].severity
        );
        for f in items.iter().take(MAX_OCCURRENCES_PER_RULE) {
            let _ = writeln!(
                prompt,
                "- {}:{}:{} {}",
                f.file.display(),
                f.line,
                f.column,
                truncate_chars(&f.message, MAX_MESSAGE_CHARS)
            );
        }
        if items.len() > MAX_OCCURRENCES_PER_RULE {
            let _ = writeln!(
                prompt,
                "- (and {} more)",
                items.len() - MAX_OCCURRENCES_PER_RULE
            );
        }
    }
    if groups.len() > MAX_RULES {
        let _ = writeln!(prompt, "({} more rules not shown)", groups.len() - MAX_RULES);
    }

    let _ = writeln!(prompt);
    let _ = writeln!(
        prompt,
        "Respond with JSON of the form {{\"summary\": string, \"suggestions\": string[]}}. \
The summary is one short paragraph on the overall health of the project. Give one suggestion \
per finding in the order the findings appear, most important first."
    );
    prompt
}

pub fn snippet_prompt(code: &str, language: &str) -> String {
    format!(
        "Review this {language} snippet from a React/TypeScript project.\n\n\
```{language}\n{code}\n```\n\n\
Respond with JSON of the form {{\"insights\": string[], \"suggestions\": string[]}}. \
Insights describe what the code does and any risks; suggestions are concrete changes."
    )
}
