//! Analyze command

use super::AnalyzeArgs;
use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use pulsecheck::ai::{AiClient, InsightReconciler};
use pulsecheck::config::{load_project_config, Overrides, ProjectConfig, UserConfig};
use pulsecheck::models::{AnalysisResult, Severity, SeverityCounts};
use pulsecheck::pipeline::{analyze_project_with, AnalysisOptions};
use pulsecheck::reporters::{report_with_format, OutputFormat};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

fn create_spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.green} {msg}")
        .expect("valid template")
}

pub fn run(args: AnalyzeArgs) -> Result<()> {
    let root = args.path.clone();
    let project_config = load_project_config(&root);

    let format = output_format(args.format.as_deref(), project_config.defaults.format.as_deref());
    let fail_on = fail_threshold(args.fail_on.as_deref(), project_config.defaults.fail_on.as_deref());
    let options = analysis_options(&args, &project_config);

    let spinner = (format == OutputFormat::Table
        && !args.no_progress
        && console::Term::stderr().is_term())
    .then(|| {
        let pb = ProgressBar::new_spinner();
        pb.set_style(create_spinner_style());
        pb.set_message("Discovering source files...");
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    });

    let mut engine = options.engine();
    if let Some(pb) = spinner.clone() {
        engine = engine.with_progress_callback(Box::new(move |path: &Path, done: usize, total: usize| {
            pb.set_message(format!("[{}/{}] {}", done, total, path.display()));
        }));
    }

    let mut result = analyze_project_with(&root, &options, &engine)?;

    let ai_enabled = args.ai || project_config.ai.enabled.unwrap_or(false);
    if ai_enabled {
        if let Some(pb) = &spinner {
            pb.set_message("Asking the AI service for a summary...");
        }
        result = enhance(&result, &args, &project_config);
    }

    if let Some(pb) = &spinner {
        pb.finish_and_clear();
    }

    let mut rendered = report_with_format(&result, format)?;
    if format == OutputFormat::Table && (args.output.is_some() || !console::colors_enabled()) {
        rendered = console::strip_ansi_codes(&rendered).into_owned();
    }

    match &args.output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            eprintln!(
                "{} Report written to {}",
                style("✓").green(),
                style(path.display()).cyan()
            );
        }
        None => print!("{}", rendered),
    }

    if let Some(threshold) = fail_on {
        check_fail_threshold(threshold, &result);
    }
    Ok(())
}

fn output_format(flag: Option<&str>, file: Option<&str>) -> OutputFormat {
    if let Some(name) = flag {
        // clap already restricted the values
        return name.parse().unwrap_or_default();
    }
    match file.map(str::parse::<OutputFormat>) {
        Some(Ok(format)) => format,
        Some(Err(e)) => {
            warn!("Ignoring format from pulsecheck.toml: {}", e);
            OutputFormat::Table
        }
        None => OutputFormat::Table,
    }
}

fn fail_threshold(flag: Option<&str>, file: Option<&str>) -> Option<Severity> {
    let name = flag.or(file)?;
    match name.parse() {
        Ok(severity) => Some(severity),
        Err(e) => {
            warn!("Ignoring fail_on: {}", e);
            None
        }
    }
}

/// Flags win over pulsecheck.toml for each of the three resolver inputs
fn analysis_options(args: &AnalyzeArgs, project: &ProjectConfig) -> AnalysisOptions {
    let file = project.overrides();
    let overrides = Overrides {
        enabled_rules: args.rules.clone().or(file.enabled_rules),
        categories: args.categories.clone().or(file.categories),
        rules: file.rules,
    };
    AnalysisOptions::default()
        .with_preset(
            args.preset
                .clone()
                .or_else(|| project.preset.clone())
                .unwrap_or_else(|| "recommended".to_string()),
        )
        .with_overrides(overrides)
        .with_workers(args.workers.or(project.defaults.workers).unwrap_or(0))
}

/// AI pass; a missing key or failed call is recorded on the result
fn enhance(result: &AnalysisResult, args: &AnalyzeArgs, project: &ProjectConfig) -> AnalysisResult {
    let user = UserConfig::load();
    let config = args.ai_args.resolve(&project.ai, &user);
    let backend = config.backend;

    match AiClient::from_env_or(backend, user.api_key(backend)) {
        Ok(client) => {
            info!("Enhancing report with {} ({})", backend, config.model());
            InsightReconciler::new(&client, config).enhance(result)
        }
        Err(e) => {
            warn!("AI enhancement skipped: {}", e);
            AnalysisResult {
                ai_enhanced: false,
                ai_model: None,
                ai_error: Some(e.to_string()),
                ..result.clone()
            }
        }
    }
}

fn exceeds_threshold(threshold: Severity, counts: &SeverityCounts) -> bool {
    counts.at_or_above(threshold) > 0
}

fn check_fail_threshold(threshold: Severity, result: &AnalysisResult) {
    let counts = SeverityCounts::from_findings(&result.findings);
    if exceeds_threshold(threshold, &counts) {
        eprintln!("Failing due to --fail-on={} threshold", threshold);
        std::process::exit(1);
    }
}
