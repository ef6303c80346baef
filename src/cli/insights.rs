//! Insights command - AI review of a single file

use super::AiArgs;
use anyhow::{Context, Result};
use console::style;
use pulsecheck::ai::{AiClient, InsightReconciler, SnippetInsights};
use pulsecheck::config::{load_project_config, UserConfig};
use serde_json::json;
use std::path::Path;

/// Snippets longer than this are cut before being sent
const MAX_SNIPPET_CHARS: usize = 12_000;

fn language_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ts") | Some("tsx") | Some("mts") | Some("cts") => "typescript",
        Some("js") | Some("jsx") | Some("mjs") | Some("cjs") => "javascript",
        _ => "text",
    }
}

pub fn run(file: &Path, ai_args: &AiArgs, as_json: bool) -> Result<()> {
    let code = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let snippet: String = code.chars().take(MAX_SNIPPET_CHARS).collect();

    let project_root = file.parent().unwrap_or_else(|| Path::new("."));
    let project = load_project_config(project_root);
    let user = UserConfig::load();
    let config = ai_args.resolve(&project.ai, &user);
    let backend = config.backend;

    let client = AiClient::from_env_or(backend, user.api_key(backend))?;
    let insights = InsightReconciler::new(&client, config)
        .snippet_insights(&snippet, language_for(file))
        .with_context(|| format!("AI insights failed for {}", file.display()))?;

    if as_json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "file": file.display().to_string(),
                "model": insights.model,
                "insights": insights.insights,
                "suggestions": insights.suggestions,
            }))?
        );
    } else {
        print!("{}", render(file, &insights));
    }
    Ok(())
}

fn render(file: &Path, insights: &SnippetInsights) -> String {
    let mut out = format!(
        "\n{} {}  {}\n",
        style("insights").bold(),
        style(file.display()).cyan(),
        style(format!("({})", insights.model)).dim()
    );
    out.push_str(&format!("\n{}\n", style("Insights").bold()));
    for item in &insights.insights {
        out.push_str(&format!("  • {}\n", item));
    }
    out.push_str(&format!("\n{}\n", style("Suggestions").bold()));
    for (i, item) in insights.suggestions.iter().enumerate() {
        out.push_str(&format!("  {}. {}\n", i + 1, item));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulsecheck::ai::Strategy;

    #[test]
    fn test_language_for() {
        assert_eq!(language_for(Path::new("a/App.tsx")), "typescript");
        assert_eq!(language_for(Path::new("index.mjs")), "javascript");
        assert_eq!(language_for(Path::new("README")), "text");
    }

    #[test]
    fn test_render_numbers_suggestions() {
        let insights = SnippetInsights {
            insights: vec!["Effect has no deps".into()],
            suggestions: vec!["Add deps".into(), "Extract hook".into()],
            model: "m".into(),
            strategy: Strategy::WholeResponse,
        };
        let out = console::strip_ansi_codes(&render(Path::new("a.tsx"), &insights)).into_owned();
        assert!(out.contains("  • Effect has no deps"));
        assert!(out.contains("  2. Extract hook"));
    }
}
