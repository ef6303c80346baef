//! CLI command definitions and handlers

mod analyze;
mod init;
mod insights;
mod rules;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use pulsecheck::ai::{AiConfig, LlmBackend};
use pulsecheck::config::{AiSettings, UserConfig};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Parse and validate workers count (0 = auto, at most 64)
fn parse_workers(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n > 64 {
        Err("workers cannot exceed 64".to_string())
    } else {
        Ok(n)
    }
}

/// pulsecheck - health checks for React and TypeScript projects
#[derive(Parser, Debug)]
#[command(name = "pulsecheck")]
#[command(
    version,
    about = "Rule-based health analysis for React and TypeScript projects",
    long_about = "pulsecheck runs a catalog of React, TypeScript, accessibility and \
performance rules over a project, scores its health from 0 to 10 and can ask an \
LLM to summarise the results.\n\n\
Run without a subcommand to analyze the current directory:\n  \
pulsecheck .",
    after_help = "\
Examples:
  pulsecheck .                                 Analyze current directory
  pulsecheck analyze . --preset strict         Strict preset
  pulsecheck analyze . --rules react-missing-key,no-var
  pulsecheck analyze . --format json           JSON output for scripting
  pulsecheck analyze . --fail-on error         Exit code 1 on errors (CI mode)
  pulsecheck analyze . --ai                    Add an AI-written summary
  pulsecheck rules --preset minimal            Show the rule catalog
  pulsecheck insights src/App.tsx              AI insights for one file"
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Used when no subcommand is given
    #[command(flatten)]
    pub analyze: AnalyzeArgs,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a project and print a health report
    Analyze(AnalyzeArgs),

    /// List the rule catalog with the effective settings of a preset
    Rules {
        /// Project path (its pulsecheck.toml is applied)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Preset to show (minimal, recommended, strict)
        #[arg(long)]
        preset: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write an example pulsecheck.toml
    Init {
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Ask the AI service for insights on a single file
    Insights {
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        ai: AiArgs,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct AnalyzeArgs {
    /// Path to the project (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Preset: minimal, recommended (default), strict
    #[arg(long, env = "PULSECHECK_PRESET")]
    pub preset: Option<String>,

    /// Only run rules in these categories (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub categories: Option<Vec<String>>,

    /// Only run these rules (comma-separated ids)
    #[arg(long, value_delimiter = ',')]
    pub rules: Option<Vec<String>>,

    /// Output format: table, json, markdown (or md)
    #[arg(long, short = 'f', value_parser = ["table", "text", "json", "markdown", "md"])]
    pub format: Option<String>,

    /// Write the report to a file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Number of parallel workers (0 = auto)
    #[arg(long, value_parser = parse_workers)]
    pub workers: Option<usize>,

    /// Exit with code 1 if findings at or above this severity exist
    #[arg(long, value_parser = ["error", "warning", "info"])]
    pub fail_on: Option<String>,

    /// Enhance the report with an AI-written summary and suggestions
    #[arg(long)]
    pub ai: bool,

    /// Hide the progress spinner
    #[arg(long)]
    pub no_progress: bool,

    #[command(flatten)]
    pub ai_args: AiArgs,
}

/// Settings for AI calls
#[derive(Args, Debug, Clone, Default)]
pub struct AiArgs {
    /// AI backend: anthropic (default), openai, ollama
    #[arg(long, env = "PULSECHECK_AI_BACKEND", value_parser = ["anthropic", "openai", "ollama"])]
    pub ai_backend: Option<String>,

    /// Model name (default depends on the backend)
    #[arg(long)]
    pub ai_model: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    pub ai_timeout: Option<u64>,

    #[arg(long)]
    pub ai_max_tokens: Option<u32>,

    #[arg(long)]
    pub ai_temperature: Option<f32>,

    /// Extra attempts after a rate-limit response
    #[arg(long)]
    pub ai_retries: Option<u32>,
}

impl AiArgs {
    /// Merge flags over the project `[ai]` table over the user config
    pub fn resolve(&self, project: &AiSettings, user: &UserConfig) -> AiConfig {
        let defaults = AiConfig::default();

        let backend = self
            .ai_backend
            .as_deref()
            .or(project.backend.as_deref())
            .and_then(|name| match name.parse::<LlmBackend>() {
                Ok(b) => Some(b),
                Err(e) => {
                    warn!("{}; using the default backend", e);
                    None
                }
            })
            .or_else(|| user.backend())
            .unwrap_or_default();

        AiConfig {
            backend,
            model: self
                .ai_model
                .clone()
                .or_else(|| project.model.clone())
                .or_else(|| user.ai.model.clone()),
            max_tokens: self
                .ai_max_tokens
                .or(project.max_tokens)
                .unwrap_or(defaults.max_tokens),
            temperature: self
                .ai_temperature
                .or(project.temperature)
                .unwrap_or(defaults.temperature),
            timeout: self
                .ai_timeout
                .or(project.timeout_secs)
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            rate_limit_retries: self
                .ai_retries
                .or(project.rate_limit_retries)
                .unwrap_or(defaults.rate_limit_retries),
        }
    }
}

/// Run the CLI
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Analyze(args)) => analyze::run(args),
        Some(Commands::Rules { path, preset, json }) => rules::run(&path, preset, json),
        Some(Commands::Init { path, force }) => init::run(&path, force),
        Some(Commands::Insights { file, json, ai }) => insights::run(&file, &ai, json),
        None => analyze::run(cli.analyze),
    }
}
