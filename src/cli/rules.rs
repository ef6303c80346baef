//! Rules command - list the catalog with effective settings

use anyhow::Result;
use console::style;
use pulsecheck::config::{load_project_config, resolve, AnalyzerConfig};
use pulsecheck::detectors::catalog;
use pulsecheck::models::Severity;
use serde_json::json;
use std::path::Path;

pub fn run(path: &Path, preset: Option<String>, as_json: bool) -> Result<()> {
    let project = load_project_config(path);
    let preset_name = preset
        .or(project.preset.clone())
        .unwrap_or_else(|| "recommended".to_string());
    let resolved = resolve(&preset_name, &project.overrides());
    for warning in &resolved.warnings {
        eprintln!("{} {}", style("warning:").yellow(), warning);
    }

    if as_json {
        println!("{}", serde_json::to_string_pretty(&rules_json(&resolved.config))?);
    } else {
        print!("{}", render_table(&resolved.config));
    }
    Ok(())
}

fn rules_json(config: &AnalyzerConfig) -> serde_json::Value {
    let rules: Vec<serde_json::Value> = catalog::all()
        .iter()
        .map(|rule| {
            json!({
                "id": rule.id,
                "name": rule.name,
                "category": rule.category,
                "description": rule.description,
                "defaultSeverity": rule.default_severity,
                "enabled": config.is_enabled(rule.id),
                "severity": config.severity_for(rule.id),
                "options": config.options_for(rule.id),
            })
        })
        .collect();
    json!({ "preset": config.preset().name(), "rules": rules })
}

fn severity_cell(severity: Severity) -> String {
    let text = format!("{:<8}", severity.to_string());
    match severity {
        Severity::Error => style(text).red().to_string(),
        Severity::Warning => style(text).yellow().to_string(),
        Severity::Info => style(text).dim().to_string(),
    }
}

fn render_table(config: &AnalyzerConfig) -> String {
    let mut out = format!(
        "\n{} preset: {}\n\n",
        style("pulsecheck").bold(),
        style(config.preset().name()).cyan()
    );
    out.push_str(&format!(
        "  {:<3} {:<26} {:<15} {:<8} {}\n",
        "ON", "RULE", "CATEGORY", "SEVERITY", "DESCRIPTION"
    ));
    let mut current_category = "";
    for rule in catalog::all() {
        if rule.category != current_category && !current_category.is_empty() {
            out.push('\n');
        }
        current_category = rule.category;

        let enabled = config.is_enabled(rule.id);
        let mark = if enabled {
            style("✓  ").green().to_string()
        } else {
            style("·  ").dim().to_string()
        };
        let severity = config.severity_for(rule.id).unwrap_or(rule.default_severity);
        out.push_str(&format!(
            "  {} {:<26} {:<15} {} {}\n",
            mark,
            rule.id,
            rule.category,
            severity_cell(severity),
            rule.description
        ));
    }
    let enabled = config.enabled_rule_ids().len();
    out.push_str(&format!(
        "\n  {} of {} rules enabled\n",
        enabled,
        catalog::all().len()
    ));
    out
}
