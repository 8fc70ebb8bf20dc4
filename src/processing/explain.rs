//! Conversational definitions of medical terms.

use super::prompts::PromptSpec;
use super::types::ExplainError;
use crate::llm::LanguageModelProvider;
use std::sync::Arc;

/// Reply for empty or whitespace-only input. No provider call is made.
pub const EMPTY_TERM_MESSAGE: &str = "Please ask a medical term.";

/// Reply when the provider could not answer. Raw errors never reach the user on this path.
pub const EXPLANATION_FALLBACK: &str =
    "I cannot explain this term right now. Please try again later or ask your doctor.";

/// What the user is shown, plus whether it is the fallback sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explanation {
    /// Text to render.
    pub text: String,
    /// `true` when [`EXPLANATION_FALLBACK`] was substituted for a provider failure.
    pub fallback: bool,
}

/// Single-turn term lookup against the configured provider.
#[derive(Clone)]
pub struct TermExplainer {
    provider: Arc<dyn LanguageModelProvider>,
    temperature: f32,
}

impl TermExplainer {
    /// Build an explainer; `temperature` is usually moderate (~0.7) for natural phrasing.
    pub fn new(provider: Arc<dyn LanguageModelProvider>, temperature: f32) -> Self {
        Self {
            provider,
            temperature,
        }
    }

    /// Explain `term`, surfacing validation and provider errors to the caller.
    pub async fn try_explain(&self, term: &str) -> Result<String, ExplainError> {
        if term.trim().is_empty() {
            return Err(ExplainError::EmptyInput);
        }
        let prompt = PromptSpec::term_explanation(term, self.provider.name());
        let text = self
            .provider
            .generate(&prompt.render(), self.temperature)
            .await?;
        Ok(text.trim().to_string())
    }

    /// Explain `term`, mapping every failure to a user-safe sentence.
    pub async fn answer(&self, term: &str) -> Explanation {
        match self.try_explain(term).await {
            Ok(text) => Explanation {
                text,
                fallback: false,
            },
            Err(ExplainError::EmptyInput) => Explanation {
                text: EMPTY_TERM_MESSAGE.to_string(),
                fallback: false,
            },
            Err(ExplainError::Provider(error)) => {
                tracing::warn!(provider = self.provider.name(), error = %error, "Term explanation failed");
                Explanation {
                    text: EXPLANATION_FALLBACK.to_string(),
                    fallback: true,
                }
            }
        }
    }

    /// Explain `term`; never fails.
    pub async fn explain(&self, term: &str) -> String {
        self.answer(term).await.text
    }
}
