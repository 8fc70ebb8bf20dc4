//! Generation service running on the local network (Ollama-compatible `/api/generate`).

use super::{LanguageModelProvider, ProviderError, endpoint_url, http_client};
use crate::config::ProviderConfig;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;

/// Non-streaming client for a local model service.
pub struct LocalServiceProvider {
    http: Client,
    config: ProviderConfig,
}

impl LocalServiceProvider {
    /// Construct the provider against `config.endpoint`.
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            http: http_client("medlens/local"),
            config,
        }
    }

    fn endpoint(&self) -> String {
        endpoint_url(&self.config.endpoint, "api/generate")
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
    #[serde(default = "default_done")]
    done: bool,
}

fn default_done() -> bool {
    true
}

#[async_trait]
impl LanguageModelProvider for LocalServiceProvider {
    fn name(&self) -> &'static str {
        self.config.kind.label()
    }

    fn context_window(&self) -> usize {
        self.config.context_window
    }

    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String, ProviderError> {
        let payload = json!({
            "model": self.config.model,
            "prompt": prompt,
            "stream": false,
            "options": {
                "temperature": temperature,
                "num_ctx": self.config.context_window,
            }
        });

        tracing::debug!(
            model = %self.config.model,
            temperature,
            num_ctx = self.config.context_window,
            "Requesting local generation"
        );

        let response = self
            .http
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                if error.is_connect() {
                    tracing::error!(endpoint = %self.config.endpoint, "Local model service unreachable");
                    ProviderError::NetworkUnavailable {
                        endpoint: self.config.endpoint.clone(),
                    }
                } else {
                    ProviderError::Http(error)
                }
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::QuotaExceeded {
                retry_hint: super::retry_hint(response.headers()),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = ProviderError::UnexpectedStatus { status, body };
            tracing::error!(error = %error, "Local model service request failed");
            return Err(error);
        }

        let body: GenerateResponse = response.json().await.map_err(|error| {
            ProviderError::MalformedResponse(format!("failed to decode local response: {error}"))
        })?;

        if !body.done {
            return Err(ProviderError::MalformedResponse(
                "local response incomplete (streaming not supported)".into(),
            ));
        }

        Ok(body.response.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderKind;
    use httpmock::{Method::POST, MockServer};

    fn provider(endpoint: String) -> LocalServiceProvider {
        LocalServiceProvider::new(ProviderConfig::for_kind(ProviderKind::Local).with_endpoint(endpoint))
    }

    #[tokio::test]
    async fn handles_successful_response() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/generate")
                    .json_body_partial(r#"{"model":"llama3.2","stream":false,"options":{"num_ctx":4096}}"#);
                then.status(200).json_body(json!({
                    "response": "- Hemoglobin: 11.2 g/dL",
                    "done": true
                }));
            })
            .await;

        let text = provider(server.base_url())
            .generate("Extract", 0.0)
            .await
            .expect("generation");

        mock.assert_async().await;
        assert_eq!(text, "- Hemoglobin: 11.2 g/dL");
    }

    #[tokio::test]
    async fn handles_error_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(500).body("boom");
            })
            .await;

        let error = provider(server.base_url())
            .generate("Extract", 0.0)
            .await
            .expect_err("error response");
        assert!(
            matches!(error, ProviderError::UnexpectedStatus { status, ref body } if status == StatusCode::INTERNAL_SERVER_ERROR && body == "boom")
        );
    }

    #[tokio::test]
    async fn refused_connection_names_the_remedy() {
        // Bind then drop a listener to obtain a port with nothing listening on it.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().expect("addr").port();
        drop(listener);

        let endpoint = format!("http://127.0.0.1:{port}");
        let error = provider(endpoint.clone())
            .generate("Extract", 0.0)
            .await
            .expect_err("connection refused");

        match &error {
            ProviderError::NetworkUnavailable { endpoint: reported } => {
                assert_eq!(reported, &endpoint)
            }
            other => panic!("expected network unavailable, got {other:?}"),
        }
        assert!(error.to_string().contains("not running"));
    }

    #[tokio::test]
    async fn incomplete_stream_is_rejected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(200)
                    .json_body(json!({ "response": "partial", "done": false }));
            })
            .await;

        let error = provider(server.base_url())
            .generate("Extract", 0.0)
            .await
            .expect_err("incomplete");
        assert!(matches!(error, ProviderError::MalformedResponse(_)));
    }
}
