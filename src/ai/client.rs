//! LLM API client supporting Anthropic and OpenAI-compatible backends
//!
//! Uses ureq (sync HTTP), so no async runtime is needed. Every call carries
//! its own timeout; a call that exceeds it fails as `TransportError::Timeout`.

use crate::ai::{AiError, AiResult, TransportError};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

/// Supported LLM backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    #[default]
    Anthropic,
    OpenAi,
    Ollama,
}

impl LlmBackend {
    pub fn env_key(&self) -> &'static str {
        match self {
            LlmBackend::Anthropic => "ANTHROPIC_API_KEY",
            LlmBackend::OpenAi => "OPENAI_API_KEY",
            LlmBackend::Ollama => "OLLAMA_MODEL",
        }
    }

    pub fn signup_url(&self) -> &'static str {
        match self {
            LlmBackend::Anthropic => "https://console.anthropic.com/settings/keys",
            LlmBackend::OpenAi => "https://platform.openai.com/api-keys",
            LlmBackend::Ollama => "https://ollama.ai (no key needed, just run locally)",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            LlmBackend::Anthropic => "claude-sonnet-4-20250514",
            LlmBackend::OpenAi => "gpt-4o",
            LlmBackend::Ollama => "llama3.1:8b",
        }
    }

    pub fn api_url(&self) -> &'static str {
        match self {
            LlmBackend::Anthropic => "https://api.anthropic.com/v1/messages",
            LlmBackend::OpenAi => "https://api.openai.com/v1/chat/completions",
            LlmBackend::Ollama => "http://localhost:11434/v1/chat/completions",
        }
    }

    pub fn is_openai_compatible(&self) -> bool {
        matches!(self, LlmBackend::OpenAi | LlmBackend::Ollama)
    }

    pub fn requires_api_key(&self) -> bool {
        !matches!(self, LlmBackend::Ollama)
    }
}

impl std::fmt::Display for LlmBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmBackend::Anthropic => write!(f, "anthropic"),
            LlmBackend::OpenAi => write!(f, "openai"),
            LlmBackend::Ollama => write!(f, "ollama"),
        }
    }
}

impl FromStr for LlmBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(LlmBackend::Anthropic),
            "openai" | "gpt" => Ok(LlmBackend::OpenAi),
            "ollama" => Ok(LlmBackend::Ollama),
            other => Err(format!(
                "unknown AI backend '{}'. Valid backends: anthropic, openai, ollama",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// Settings for AI calls
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub backend: LlmBackend,
    pub model: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
    /// Extra attempts after a rate-limit response (0 = single attempt)
    pub rate_limit_retries: u32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            backend: LlmBackend::default(),
            model: None,
            max_tokens: 2048,
            temperature: 0.2,
            timeout: Duration::from_secs(60),
            rate_limit_retries: 0,
        }
    }
}

impl AiConfig {
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.backend.default_model())
    }

    /// Build one request with these settings
    pub fn request(&self, prompt: impl Into<String>, system: Option<&str>) -> CompletionRequest {
        CompletionRequest {
            prompt: prompt.into(),
            system: system.map(str::to_string),
            model: self.model().to_string(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            timeout: self.timeout,
        }
    }
}

/// One prompt/response exchange
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub system: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

/// A blocking text-completion call. Implementations return the response's
/// concatenated text content.
pub trait AiTransport: Send + Sync {
    fn complete(&self, request: &CompletionRequest) -> Result<String, TransportError>;
}

/// Longest wait between rate-limit retries
const MAX_BACKOFF_MS: u64 = 30_000;

/// Exponential backoff from 500ms, capped at [`MAX_BACKOFF_MS`]
fn backoff_for(attempt: u32) -> Duration {
    let exp = 2u64.saturating_pow(attempt.saturating_sub(1));
    Duration::from_millis(500u64.saturating_mul(exp).min(MAX_BACKOFF_MS))
}

/// Call `transport`, retrying up to `retries` extra times on rate limiting
pub fn complete_with_retry(
    transport: &dyn AiTransport,
    request: &CompletionRequest,
    retries: u32,
) -> Result<String, TransportError> {
    let mut attempt = 0;
    loop {
        match transport.complete(request) {
            Err(TransportError::RateLimited(msg)) if attempt < retries => {
                attempt += 1;
                let backoff = backoff_for(attempt);
                warn!(
                    "AI service rate limited ({}); retry {}/{} in {:?}",
                    msg, attempt, retries, backoff
                );
                std::thread::sleep(backoff);
            }
            other => return other,
        }
    }
}

/// Unified LLM client over HTTP
pub struct AiClient {
    backend: LlmBackend,
    api_key: String,
}

fn make_agent(timeout: Duration) -> ureq::Agent {
    ureq::config::Config::builder()
        .http_status_as_error(false) // status codes are mapped to TransportError below
        .timeout_global(Some(timeout))
        .build()
        .new_agent()
}

fn map_ureq_error(err: ureq::Error, timeout: Duration) -> TransportError {
    match err {
        ureq::Error::Timeout(_) => TransportError::Timeout(timeout.as_secs()),
        ureq::Error::Io(io) if io.kind() == std::io::ErrorKind::TimedOut => {
            TransportError::Timeout(timeout.as_secs())
        }
        other => TransportError::Other {
            status: 0,
            message: other.to_string(),
        },
    }
}

impl AiClient {
    pub fn new(backend: LlmBackend, api_key: impl Into<String>) -> Self {
        Self {
            backend,
            api_key: api_key.into(),
        }
    }

    /// Read the key from the backend's environment variable
    pub fn from_env(backend: LlmBackend) -> AiResult<Self> {
        Self::from_env_or(backend, None)
    }

    /// Environment variable first, then `fallback_key` (e.g. from the user
    /// config file)
    pub fn from_env_or(backend: LlmBackend, fallback_key: Option<String>) -> AiResult<Self> {
        if !backend.requires_api_key() {
            return Ok(Self::new(backend, "ollama"));
        }

        let env_key = backend.env_key();
        let api_key = env::var(env_key)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or(fallback_key)
            .ok_or_else(|| AiError::MissingApiKey {
                env_var: env_key.to_string(),
                signup_url: backend.signup_url().to_string(),
            })?;

        Ok(Self::new(backend, api_key))
    }

    pub fn backend(&self) -> LlmBackend {
        self.backend
    }

    fn send(
        &self,
        request: &CompletionRequest,
        body: &impl Serialize,
    ) -> Result<String, TransportError> {
        let agent = make_agent(request.timeout);
        let mut req = agent
            .post(self.backend.api_url())
            .header("Content-Type", "application/json");

        if self.backend.is_openai_compatible() {
            if self.backend.requires_api_key() {
                req = req.header("Authorization", &format!("Bearer {}", self.api_key));
            }
        } else {
            req = req
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", "2023-06-01");
        }

        debug!(
            "AI request to {} (model {}, {} prompt chars)",
            self.backend,
            request.model,
            request.prompt.len()
        );

        let response = req
            .send_json(body)
            .map_err(|e| map_ureq_error(e, request.timeout))?;

        let status = response.status().as_u16();
        let text = response
            .into_body()
            .read_to_string()
            .map_err(|e| map_ureq_error(e, request.timeout))?;

        if status >= 400 {
            return Err(TransportError::from_status(status, text));
        }
        Ok(text)
    }

    fn complete_openai(&self, request: &CompletionRequest) -> Result<String, TransportError> {
        let mut messages = Vec::new();
        if let Some(sys) = &request.system {
            messages.push(Message::system(sys.clone()));
        }
        messages.push(Message::user(request.prompt.clone()));

        let body = OpenAiRequest {
            model: request.model.clone(),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let raw = self.send(request, &body)?;
        let resp: OpenAiResponse = serde_json::from_str(&raw).map_err(|e| unexpected_body(&e))?;
        Ok(resp
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }

    fn complete_anthropic(&self, request: &CompletionRequest) -> Result<String, TransportError> {
        let body = AnthropicRequest {
            model: request.model.clone(),
            max_tokens: request.max_tokens,
            messages: vec![Message::user(request.prompt.clone())],
            system: request.system.clone(),
            temperature: Some(request.temperature),
        };

        let raw = self.send(request, &body)?;
        let resp: AnthropicResponse =
            serde_json::from_str(&raw).map_err(|e| unexpected_body(&e))?;
        Ok(resp
            .content
            .into_iter()
            .filter(|c| c.content_type == "text")
            .map(|c| c.text)
            .collect::<Vec<_>>()
            .join(""))
    }
}

fn unexpected_body(err: &serde_json::Error) -> TransportError {
    TransportError::Other {
        status: 200,
        message: format!("unexpected response body: {}", err),
    }
}

impl AiTransport for AiClient {
    fn complete(&self, request: &CompletionRequest) -> Result<String, TransportError> {
        if self.backend.is_openai_compatible() {
            self.complete_openai(request)
        } else {
            self.complete_anthropic(request)
        }
    }
}

// OpenAI API types
#[derive(Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    #[serde(default)]
    content: Option<String>,
}

// Anthropic API types
#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_backend_defaults() {
        assert_eq!(LlmBackend::OpenAi.default_model(), "gpt-4o");
        assert_eq!(
            LlmBackend::Anthropic.default_model(),
            "claude-sonnet-4-20250514"
        );
        assert!(!LlmBackend::Ollama.requires_api_key());
    }

    #[test]
    fn test_backend_parsing() {
        assert_eq!("OpenAI".parse::<LlmBackend>().unwrap(), LlmBackend::OpenAi);
        assert_eq!("claude".parse::<LlmBackend>().unwrap(), LlmBackend::Anthropic);
        assert!("bard".parse::<LlmBackend>().is_err());
    }

    #[test]
    fn test_config_model_and_request() {
        let config = AiConfig::default();
        assert_eq!(config.model(), "claude-sonnet-4-20250514");

        let config = AiConfig {
            model: Some("custom-model".to_string()),
            timeout: Duration::from_secs(5),
            ..Default::default()
        };
        let req = config.request("hello", Some("sys"));
        assert_eq!(req.model, "custom-model");
        assert_eq!(req.timeout, Duration::from_secs(5));
        assert_eq!(req.system.as_deref(), Some("sys"));
    }

    #[test]
    fn test_anthropic_content_concatenated() {
        let raw = r#"{"content":[{"type":"text","text":"Hello "},{"type":"tool_use"},{"type":"text","text":"world"}]}"#;
        let resp: AnthropicResponse = serde_json::from_str(raw).unwrap();
        let text: String = resp
            .content
            .into_iter()
            .filter(|c| c.content_type == "text")
            .map(|c| c.text)
            .collect();
        assert_eq!(text, "Hello world");
    }

    struct Scripted(Mutex<Vec<Result<String, TransportError>>>);

    impl AiTransport for Scripted {
        fn complete(&self, _request: &CompletionRequest) -> Result<String, TransportError> {
            self.0.lock().unwrap().remove(0)
        }
    }

    #[test]
    fn test_backoff_is_capped() {
        assert_eq!(backoff_for(1), Duration::from_millis(500));
        assert_eq!(backoff_for(3), Duration::from_millis(2_000));
        assert_eq!(backoff_for(10), Duration::from_millis(MAX_BACKOFF_MS));
        assert_eq!(backoff_for(64), Duration::from_millis(MAX_BACKOFF_MS));
        assert_eq!(backoff_for(u32::MAX), Duration::from_millis(MAX_BACKOFF_MS));
    }

    #[test]
    fn test_retry_on_rate_limit_only() {
        let transport = Scripted(Mutex::new(vec![
            Err(TransportError::RateLimited("slow down".into())),
            Ok("done".into()),
        ]));
        let req = AiConfig::default().request("p", None);
        assert_eq!(complete_with_retry(&transport, &req, 1).unwrap(), "done");

        let transport = Scripted(Mutex::new(vec![Err(TransportError::RateLimited(
            "slow down".into(),
        ))]));
        assert!(matches!(
            complete_with_retry(&transport, &req, 0),
            Err(TransportError::RateLimited(_))
        ));

        let transport = Scripted(Mutex::new(vec![Err(TransportError::Authentication(
            "nope".into(),
        ))]));
        assert!(matches!(
            complete_with_retry(&transport, &req, 3),
            Err(TransportError::Authentication(_))
        ));
    }
}
