//! Project-level configuration support
//!
//! Loads per-project configuration from `pulsecheck.toml` or
//! `.pulsecheckrc.json` in the project root.
//!
//! # Configuration Format
//!
//! ```toml
//! # pulsecheck.toml
//! preset = "recommended"
//! categories = ["correctness", "react-hooks"]
//! enabled_rules = ["react-missing-key"]
//!
//! [rules.large-component]
//! severity = "warning"
//! options = { max_lines = 400 }
//!
//! [rules.no-console]
//! enabled = true
//! options = { allow = "error,warn" }
//!
//! [ai]
//! backend = "anthropic"
//! timeout_secs = 30
//!
//! [defaults]
//! format = "table"
//! fail_on = "error"
//! ```
//!
//! A file that cannot be read or parsed is logged and ignored.

use crate::config::resolver::{Overrides, RuleOverride};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

pub const TOML_FILE: &str = "pulsecheck.toml";
pub const JSON_FILE: &str = ".pulsecheckrc.json";

/// Written by `pulsecheck init`
pub const EXAMPLE_CONFIG: &str = r#"# pulsecheck configuration
#
# preset: minimal | recommended | strict
preset = "recommended"

# Only run rules in these categories (omit to run every category)
# categories = ["correctness", "react-hooks", "type-safety"]

# Only run these rules (omit to use the preset)
# enabled_rules = ["react-missing-key"]

[rules.large-component]
options = { max_lines = 250 }

[rules.loose-equality]
options = { allow_null = true }

# [rules.no-console]
# enabled = true
# severity = "warning"
# options = { allow = "error,warn" }

[ai]
# backend = "anthropic"   # anthropic | openai | ollama
# model = "claude-sonnet-4-20250514"
timeout_secs = 60
max_tokens = 2048
temperature = 0.2

[defaults]
format = "table"
# fail_on = "error"
"#;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub preset: Option<String>,
    #[serde(default)]
    pub categories: Option<Vec<String>>,
    #[serde(default)]
    pub enabled_rules: Option<Vec<String>>,
    #[serde(default)]
    pub rules: BTreeMap<String, RuleOverride>,
    #[serde(default)]
    pub ai: AiSettings,
    #[serde(default)]
    pub defaults: CliDefaults,
}

/// `[ai]` table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiSettings {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub backend: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub rate_limit_retries: Option<u32>,
}

/// `[defaults]` table: fallbacks for CLI flags
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CliDefaults {
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub workers: Option<usize>,
    #[serde(default)]
    pub fail_on: Option<String>,
}

impl ProjectConfig {
    /// Resolver overrides carried by this file
    pub fn overrides(&self) -> Overrides {
        Overrides {
            enabled_rules: self.enabled_rules.clone(),
            categories: self.categories.clone(),
            rules: self.rules.clone(),
        }
    }
}

/// Load project configuration from the project root.
///
/// Searches `pulsecheck.toml`, then `.pulsecheckrc.json`. Returns the default
/// configuration if neither exists or loads.
pub fn load_project_config(root: &Path) -> ProjectConfig {
    let toml_path = root.join(TOML_FILE);
    if toml_path.exists() {
        match load_toml_config(&toml_path) {
            Ok(config) => {
                debug!("Loaded project config from {}", toml_path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {}", toml_path.display(), e);
            }
        }
    }

    let json_path = root.join(JSON_FILE);
    if json_path.exists() {
        match load_json_config(&json_path) {
            Ok(config) => {
                debug!("Loaded project config from {}", json_path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {}", json_path.display(), e);
            }
        }
    }

    debug!("No project config found, using defaults");
    ProjectConfig::default()
}

fn load_toml_config(path: &Path) -> anyhow::Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: ProjectConfig = toml::from_str(&content)?;
    Ok(config)
}

fn load_json_config(path: &Path) -> anyhow::Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: ProjectConfig = serde_json::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::options::OptionValue;
    use crate::models::Severity;
    use tempfile::tempdir;

    #[test]
    fn test_example_config_parses() {
        let config: ProjectConfig = toml::from_str(EXAMPLE_CONFIG).unwrap();
        assert_eq!(config.preset.as_deref(), Some("recommended"));
        assert_eq!(
            config.rules["large-component"].options.get("max_lines"),
            Some(&OptionValue::Integer(250))
        );
        assert_eq!(config.ai.timeout_secs, Some(60));
        assert_eq!(config.defaults.format.as_deref(), Some("table"));
    }

    #[test]
    fn test_load_toml() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(TOML_FILE),
            "preset = \"strict\"\nenabled_rules = [\"no-var\"]\n\n[rules.no-var]\nseverity = \"error\"\n",
        )
        .unwrap();
        let config = load_project_config(dir.path());
        assert_eq!(config.preset.as_deref(), Some("strict"));
        let overrides = config.overrides();
        assert_eq!(overrides.enabled_rules, Some(vec!["no-var".to_string()]));
        assert_eq!(overrides.rules["no-var"].severity, Some(Severity::Error));
    }

    #[test]
    fn test_load_json() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(JSON_FILE),
            r#"{"preset": "minimal", "categories": ["accessibility"]}"#,
        )
        .unwrap();
        let config = load_project_config(dir.path());
        assert_eq!(config.preset.as_deref(), Some("minimal"));
        assert_eq!(config.categories, Some(vec!["accessibility".to_string()]));
    }

    #[test]
    fn test_invalid_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(TOML_FILE), "preset = [not toml").unwrap();
        assert_eq!(load_project_config(dir.path()), ProjectConfig::default());
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempdir().unwrap();
        assert_eq!(load_project_config(dir.path()), ProjectConfig::default());
    }
}
