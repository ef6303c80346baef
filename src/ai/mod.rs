//! AI-assisted report enhancement
//!
//! Sends a compact view of an analysis to an LLM and folds the answer back
//! into the report. Uses BYOK (bring your own key): API keys come from the
//! environment or the user config file.
//!
//! # Environment Variables
//!
//! - `ANTHROPIC_API_KEY`: Required for the Anthropic backend
//! - `OPENAI_API_KEY`: Required for the OpenAI backend
//! - `OLLAMA_MODEL`: Optional model override for a local Ollama server
//!
//! # Example
//!
//! ```rust,ignore
//! use pulsecheck::ai::{AiClient, AiConfig, InsightReconciler, LlmBackend};
//!
//! let config = AiConfig::default();
//! let client = AiClient::from_env(LlmBackend::Anthropic)?;
//! let enhanced = InsightReconciler::new(&client, config).enhance(&result);
//! ```
//!
//! The model's reply is free text. [`extract`] decodes it with an ordered
//! fallback chain, so a reply that is not valid JSON still produces a
//! summary and suggestions.

mod client;
mod enhance;
pub mod extract;
pub mod prompts;

pub use client::{
    complete_with_retry, AiClient, AiConfig, AiTransport, CompletionRequest, LlmBackend, Message,
    Role,
};
pub use enhance::{InsightReconciler, SnippetInsights};
pub use extract::{extract, Extraction, PayloadKind, Strategy};

use thiserror::Error;

/// Failure of a single request/response exchange with the AI service.
///
/// Each variant renders a distinct cause so callers can tell them apart.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("authentication failed: the AI service rejected the API key ({0})")]
    Authentication(String),

    #[error("rate limited: the AI service is throttling requests ({0})")]
    RateLimited(String),

    #[error("malformed request: the AI service could not process the prompt ({0})")]
    BadRequest(String),

    #[error("no response from the AI service within {0} seconds")]
    Timeout(u64),

    /// Status 0 means no HTTP status was received
    #[error("AI service error (status {status}): {message}")]
    Other { status: u16, message: String },
}

impl TransportError {
    /// Translate an HTTP error status and body
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            401 | 403 => TransportError::Authentication(body),
            429 => TransportError::RateLimited(body),
            400 | 413 | 422 => TransportError::BadRequest(body),
            _ => TransportError::Other {
                status,
                message: body,
            },
        }
    }

    /// Short machine-friendly name of the failure kind
    pub fn kind(&self) -> &'static str {
        match self {
            TransportError::Authentication(_) => "authentication",
            TransportError::RateLimited(_) => "rate-limit",
            TransportError::BadRequest(_) => "bad-request",
            TransportError::Timeout(_) => "timeout",
            TransportError::Other { .. } => "other",
        }
    }
}

/// Errors that can occur in the AI module
#[derive(Error, Debug)]
pub enum AiError {
    #[error("Missing API key: {env_var} not set. Get your key at {signup_url}")]
    MissingApiKey { env_var: String, signup_url: String },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("the AI service returned an empty response")]
    EmptyResponse,

    #[error("Failed to parse AI response: {0}")]
    Parse(String),

    #[error("Invalid AI configuration: {0}")]
    Config(String),
}

pub type AiResult<T> = Result<T, AiError>;

/// Truncate to `max` characters, ending with "..." when shortened
pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}
