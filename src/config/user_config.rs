//! User-level configuration for pulsecheck
//!
//! Supports loading config from:
//! - Environment variables
//! - ~/.config/pulsecheck/config.toml

use crate::ai::LlmBackend;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct UserConfig {
    #[serde(default)]
    pub ai: UserAiConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct UserAiConfig {
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    /// Default model to use
    pub model: Option<String>,
    /// "anthropic" (default), "openai" or "ollama"
    pub backend: Option<String>,
}

impl UserConfig {
    /// Load config with priority:
    /// 1. Environment variables (highest)
    /// 2. User config (~/.config/pulsecheck/config.toml)
    pub fn load() -> Self {
        let mut config = Self::user_config_path()
            .filter(|p| p.exists())
            .map(|p| Self::load_file(&p))
            .unwrap_or_default();
        config.apply_env();
        config
    }

    /// Read one config file; a broken file is logged and ignored
    pub fn load_file(path: &Path) -> Self {
        let parsed = std::fs::read_to_string(path)
            .map_err(anyhow::Error::from)
            .and_then(|content| toml::from_str::<UserConfig>(&content).map_err(Into::into));
        match parsed {
            Ok(config) => {
                debug!("Loaded user config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("Failed to load {}: {}", path.display(), e);
                UserConfig::default()
            }
        }
    }

    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("pulsecheck").join("config.toml"))
    }

    fn apply_env(&mut self) {
        if let Some(key) = non_empty_env("ANTHROPIC_API_KEY") {
            self.ai.anthropic_api_key = Some(key);
        }
        if let Some(key) = non_empty_env("OPENAI_API_KEY") {
            self.ai.openai_api_key = Some(key);
        }
    }

    /// Configured backend, if it names a known one
    pub fn backend(&self) -> Option<LlmBackend> {
        let name = self.ai.backend.as_deref()?;
        match name.parse() {
            Ok(backend) => Some(backend),
            Err(e) => {
                warn!("Ignoring user config backend: {}", e);
                None
            }
        }
    }

    /// API key for `backend`, if one is configured
    pub fn api_key(&self, backend: LlmBackend) -> Option<String> {
        match backend {
            LlmBackend::Anthropic => self.ai.anthropic_api_key.clone(),
            LlmBackend::OpenAi => self.ai.openai_api_key.clone(),
            LlmBackend::Ollama => None,
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
