//! Hosted chat-completion API authenticated with a bearer credential.
//!
//! Each call sends a fresh single-turn conversation: no history is carried between calls.

use super::{
    LanguageModelProvider, ProviderError, endpoint_url, http_client, missing_credential,
    retry_hint,
};
use crate::config::ProviderConfig;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct ChatCloudProvider {
    http: Client,
    config: ProviderConfig,
}

impl ChatCloudProvider {
    /// Construct the provider, reporting a missing credential up front.
    pub fn new(config: ProviderConfig) -> Self {
        if !config.has_credential() {
            tracing::error!(
                provider = config.kind.label(),
                "No bearer credential configured; every generation request will fail"
            );
        }
        Self {
            http: http_client("medlens/chat"),
            config,
        }
    }

    fn endpoint(&self) -> String {
        endpoint_url(&self.config.endpoint, "chat/completions")
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Pull a provider-supplied message out of an error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.to_string();
    };
    value
        .pointer("/error/message")
        .or_else(|| value.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl LanguageModelProvider for ChatCloudProvider {
    fn name(&self) -> &'static str {
        self.config.kind.label()
    }

    fn context_window(&self) -> usize {
        self.config.context_window
    }

    fn check_ready(&self) -> Result<(), ProviderError> {
        missing_credential(&self.config).map_or(Ok(()), Err)
    }

    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String, ProviderError> {
        self.check_ready()?;
        let token = self.config.credential.as_deref().unwrap_or_default();

        let payload = json!({
            "model": self.config.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": temperature,
        });

        tracing::debug!(
            model = %self.config.model,
            temperature,
            prompt_chars = prompt.chars().count(),
            "Requesting chat completion"
        );

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_hint = retry_hint(response.headers());
            tracing::warn!(%status, "Chat provider rate limit reached");
            return Err(ProviderError::QuotaExceeded { retry_hint });
        }
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let error = ProviderError::UnexpectedStatus {
                status,
                body: error_message(&raw),
            };
            tracing::error!(error = %error, "Chat provider request failed");
            return Err(error);
        }

        let body: ChatCompletionResponse = response.json().await.map_err(|error| {
            ProviderError::MalformedResponse(format!(
                "failed to decode chat completion response: {error}"
            ))
        })?;

        Ok(body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .unwrap_or_default())
    }
}
