//! Language model provider abstraction and its three HTTP backends.
//!
//! Every backend implements [`LanguageModelProvider`]: one prompt in, one complete text out.
//! Callers pick the variant through [`ProviderConfig`] and never branch on it themselves, so
//! swapping a hosted key-authenticated API for a chat-completion API or a local model service
//! is purely a configuration change.
//!
//! - [`KeyedCloudProvider`]: hosted `generateContent` endpoint, key carried in the URL.
//! - [`ChatCloudProvider`]: hosted chat-completion endpoint, bearer token, single-turn messages.
//! - [`LocalServiceProvider`]: local `/api/generate` service, non-streaming.

mod chat;
mod keyed;
mod local;

pub use chat::ChatCloudProvider;
pub use keyed::KeyedCloudProvider;
pub use local::LocalServiceProvider;

use crate::config::{ProviderConfig, ProviderKind};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, header::HeaderMap};
use std::sync::Arc;
use thiserror::Error;

/// Retry advice used when a provider rejects a request for quota reasons without saying when.
pub const DEFAULT_RETRY_HINT: &str = "Please try again in 5-10 minutes.";

/// Errors surfaced by language model providers.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The selected provider requires a credential and none was configured.
    #[error("{provider} API key is missing. Set LLM_API_KEY in your environment or .env file.")]
    MissingCredential {
        /// Provider label (`keyed`, `chat`).
        provider: &'static str,
    },
    /// Provider answered HTTP 429.
    #[error("Quota exceeded (429). The provider's rate limit is temporarily exhausted. {retry_hint}")]
    QuotaExceeded {
        /// Human-readable advice on when to retry.
        retry_hint: String,
    },
    /// The local model service could not be reached.
    #[error(
        "Local model service is not running at {endpoint}. Start it (for example `ollama serve`) and try again."
    )]
    NetworkUnavailable {
        /// Base URL that refused the connection.
        endpoint: String,
    },
    /// Provider responded with a non-success status.
    #[error("Provider error ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the provider.
        status: StatusCode,
        /// Provider-supplied message, or the raw body when none could be parsed.
        body: String,
    },
    /// Response body could not be decoded.
    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),
    /// HTTP layer failed before a response was received.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl ProviderError {
    /// Fatal errors abort the whole request instead of being recorded per chunk.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::MissingCredential { .. })
    }
}

/// Interface implemented by text generation backends.
#[async_trait]
pub trait LanguageModelProvider: Send + Sync {
    /// Stable label for logs (`keyed`, `chat`, `local`).
    fn name(&self) -> &'static str;

    /// Context window budget in tokens.
    fn context_window(&self) -> usize;

    /// Fail immediately when the provider cannot possibly succeed (e.g. no credential).
    fn check_ready(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    /// Generate a complete response for `prompt`.
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String, ProviderError>;
}

/// Build the provider selected by configuration.
pub fn build_provider(config: &ProviderConfig) -> Arc<dyn LanguageModelProvider> {
    match config.kind {
        ProviderKind::Keyed => Arc::new(KeyedCloudProvider::new(config.clone())),
        ProviderKind::Chat => Arc::new(ChatCloudProvider::new(config.clone())),
        ProviderKind::Local => Arc::new(LocalServiceProvider::new(config.clone())),
    }
}

pub(crate) fn http_client(agent: &str) -> Client {
    Client::builder()
        .user_agent(agent)
        .build()
        .unwrap_or_else(|error| {
            tracing::warn!(%error, "Falling back to default HTTP client configuration");
            Client::new()
        })
}

pub(crate) fn endpoint_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}

/// Turn a 429 response into retry advice, honouring `Retry-After` when it holds seconds.
pub(crate) fn retry_hint(headers: &HeaderMap) -> String {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(|seconds| format!("Please try again in {seconds} seconds."))
        .unwrap_or_else(|| DEFAULT_RETRY_HINT.to_string())
}

pub(crate) fn missing_credential(config: &ProviderConfig) -> Option<ProviderError> {
    if config.has_credential() {
        None
    } else {
        Some(ProviderError::MissingCredential {
            provider: config.kind.label(),
        })
    }
}
