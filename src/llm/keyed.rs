//! Hosted generation API authenticated by a static key embedded in the request URL.

use super::{
    LanguageModelProvider, ProviderError, endpoint_url, http_client, missing_credential,
    retry_hint,
};
use crate::config::ProviderConfig;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;

/// Single-shot client for a `models/{model}:generateContent` endpoint.
pub struct KeyedCloudProvider {
    http: Client,
    config: ProviderConfig,
}

impl KeyedCloudProvider {
    /// Construct the provider. A missing key is reported loudly here and returned as
    /// [`ProviderError::MissingCredential`] on first use.
    pub fn new(config: ProviderConfig) -> Self {
        if !config.has_credential() {
            tracing::error!(
                provider = config.kind.label(),
                "No API key configured; every generation request will fail"
            );
        }
        Self {
            http: http_client("medlens/keyed"),
            config,
        }
    }

    fn endpoint(&self) -> String {
        endpoint_url(
            &self.config.endpoint,
            &format!("v1beta/models/{}:generateContent", self.config.model),
        )
    }
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Default, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// First candidate's first text part; absent fields yield an empty string.
    fn into_text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts.into_iter().next())
            .and_then(|part| part.text)
            .unwrap_or_default()
    }
}

#[async_trait]
impl LanguageModelProvider for KeyedCloudProvider {
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
        let key = self.config.credential.as_deref().unwrap_or_default();

        let payload = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "temperature": temperature },
        });

        tracing::debug!(
            model = %self.config.model,
            temperature,
            prompt_chars = prompt.chars().count(),
            "Requesting keyed generation"
        );

        // The key travels in the query string, so transport errors must not echo the URL.
        let response = self
            .http
            .post(self.endpoint())
            .query(&[("key", key)])
            .json(&payload)
            .send()
            .await
            .map_err(|error| ProviderError::Http(error.without_url()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_hint = retry_hint(response.headers());
            tracing::warn!(%status, "Keyed provider quota exhausted");
            return Err(ProviderError::QuotaExceeded { retry_hint });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = ProviderError::UnexpectedStatus { status, body };
            tracing::error!(error = %error, "Keyed provider request failed");
            return Err(error);
        }

        let body: GenerateContentResponse = response.json().await.map_err(|error| {
            ProviderError::MalformedResponse(format!(
                "failed to decode generateContent response: {}",
                error.without_url()
            ))
        })?;
        let text = body.into_text();
        if text.is_empty() {
            tracing::debug!("Keyed provider returned no text content");
        }
        Ok(text)
    }
}
