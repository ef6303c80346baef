//! Insight reconciler
//!
//! Folds an AI answer back into an [`AnalysisResult`]. Enhancement is
//! fail-soft: whatever goes wrong, the caller gets a usable report back with
//! the same findings and score.
//!
//! Suggestions pair with findings by index. When the model returns fewer
//! suggestions than there are findings, the remaining findings use their own
//! message as the suggestion.
//!
//! Enhancing an already-enhanced result is allowed. The newest outcome always
//! replaces `ai_enhanced`, `ai_model` and `ai_error` together.

use crate::ai::client::{complete_with_retry, AiConfig, AiTransport};
use crate::ai::extract::{extract, Extraction, PayloadKind, Strategy};
use crate::ai::prompts::{report_prompt, snippet_prompt, SYSTEM_PROMPT};
use crate::ai::{AiError, AiResult};
use crate::models::AnalysisResult;
use tracing::{debug, info, warn};

/// Insights for a single code snippet
#[derive(Debug, Clone, PartialEq)]
pub struct SnippetInsights {
    pub insights: Vec<String>,
    pub suggestions: Vec<String>,
    pub model: String,
    pub strategy: Strategy,
}

pub struct InsightReconciler<'a> {
    transport: &'a dyn AiTransport,
    config: AiConfig,
}

impl<'a> InsightReconciler<'a> {
    pub fn new(transport: &'a dyn AiTransport, config: AiConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    /// Enhance `result`. Never fails; see the module docs.
    pub fn enhance(&self, result: &AnalysisResult) -> AnalysisResult {
        let model = self.config.model().to_string();
        match self.ask(&report_prompt(result), PayloadKind::Report) {
            Ok(extraction) => {
                info!(
                    "AI enhancement applied ({} suggestions via {:?})",
                    extraction.suggestions.len(),
                    extraction.strategy
                );
                merge(result, extraction, model)
            }
            Err(e) => {
                warn!("AI enhancement failed: {}", e);
                AnalysisResult {
                    ai_enhanced: false,
                    ai_model: None,
                    ai_error: Some(e.to_string()),
                    ..result.clone()
                }
            }
        }
    }

    /// Insights and suggestions for one snippet
    pub fn snippet_insights(&self, code: &str, language: &str) -> AiResult<SnippetInsights> {
        let extraction = self.ask(&snippet_prompt(code, language), PayloadKind::Snippet)?;
        Ok(SnippetInsights {
            insights: extraction.insights,
            suggestions: extraction.suggestions,
            model: self.config.model().to_string(),
            strategy: extraction.strategy,
        })
    }

    fn ask(&self, prompt: &str, kind: PayloadKind) -> AiResult<Extraction> {
        let request = self.config.request(prompt, Some(SYSTEM_PROMPT));
        debug!(
            "AI request: model={} prompt_chars={} timeout={:?}",
            request.model,
            request.prompt.len(),
            request.timeout
        );
        let text =
            complete_with_retry(self.transport, &request, self.config.rate_limit_retries)?;
        if text.trim().is_empty() {
            return Err(AiError::EmptyResponse);
        }
        Ok(extract(&text, kind))
    }
}

fn merge(result: &AnalysisResult, extraction: Extraction, model: String) -> AnalysisResult {
    let findings = result
        .findings
        .iter()
        .enumerate()
        .map(|(i, f)| match extraction.suggestions.get(i) {
            Some(s) => f.with_suggestion(s.as_str()),
            None => f.with_suggestion(f.message.as_str()),
        })
        .collect();

    AnalysisResult {
        summary: extraction.summary.unwrap_or_else(|| result.summary.clone()),
        findings,
        ai_enhanced: true,
        ai_model: Some(model),
        ai_error: None,
        ..result.clone()
    }
}
