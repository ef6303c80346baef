//! Configuration module for pulsecheck
//!
//! This module handles:
//! - Preset templates (minimal / recommended / strict)
//! - Resolution of a preset plus overrides into an effective config
//! - Project-level configuration (pulsecheck.toml)
//! - User-level configuration (AI keys and backend)

pub mod options;
pub mod preset;
pub mod resolver;
mod project_config;
mod user_config;

pub use options::{OptionValue, RuleOptions};
pub use preset::Preset;
pub use project_config::{
    load_project_config, AiSettings, CliDefaults, ProjectConfig, EXAMPLE_CONFIG, JSON_FILE,
    TOML_FILE,
};
pub use resolver::{resolve, resolve_preset, AnalyzerConfig, Overrides, Resolved, RuleConfig, RuleOverride};
pub use user_config::{UserAiConfig, UserConfig};
