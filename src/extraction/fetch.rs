//! Retrieval of document bytes from a reference's location.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while downloading or reading a document.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Location is neither a supported URL nor a usable path.
    #[error("Invalid document location: {0}")]
    InvalidLocation(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Storage answered with a non-success status (expired link, missing object, ...).
    #[error("Unexpected storage response ({status})")]
    UnexpectedStatus {
        /// HTTP status returned by the storage endpoint.
        status: StatusCode,
    },
    /// Local file could not be read.
    #[error("Failed to read document file: {0}")]
    Io(#[from] std::io::Error),
    /// The document was fetched but contained no bytes.
    #[error("Document is empty")]
    Empty,
}

/// Source of raw document bytes.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Fetch the complete document body.
    async fn fetch(&self, location: &str) -> Result<Vec<u8>, FetchError>;
}

/// Fetches `http(s)://` locations with reqwest and `file://` locations or bare paths from disk.
pub struct HttpFetcher {
    http: Client,
}

impl HttpFetcher {
    /// Construct a fetcher with a shared HTTP client.
    pub fn new() -> Self {
        Self {
            http: crate::llm::http_client("medlens/fetch"),
        }
    }

    async fn fetch_url(&self, url: Url) -> Result<Vec<u8>, FetchError> {
        // Signed URLs carry credentials in the query string; keep them out of logs and errors.
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|error| FetchError::Http(error.without_url()))?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%status, "Document storage returned an error status");
            return Err(FetchError::UnexpectedStatus { status });
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|error| FetchError::Http(error.without_url()))?;
        Ok(bytes.to_vec())
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

enum Target {
    Remote(Url),
    Local(PathBuf),
}

fn resolve(location: &str) -> Result<Target, FetchError> {
    let trimmed = location.trim();
    if trimmed.is_empty() {
        return Err(FetchError::InvalidLocation("location is empty".into()));
    }
    match Url::parse(trimmed) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(Target::Remote(url)),
            "file" => url
                .to_file_path()
                .map(Target::Local)
                .map_err(|()| FetchError::InvalidLocation("malformed file URL".into())),
            other => Err(FetchError::InvalidLocation(format!(
                "unsupported scheme '{other}'"
            ))),
        },
        Err(_) => Ok(Target::Local(PathBuf::from(trimmed))),
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch(&self, location: &str) -> Result<Vec<u8>, FetchError> {
        let bytes = match resolve(location)? {
            Target::Remote(url) => self.fetch_url(url).await?,
            Target::Local(path) => tokio::fs::read(&path).await?,
        };
        if bytes.is_empty() {
            return Err(FetchError::Empty);
        }
        tracing::debug!(bytes = bytes.len(), "Fetched document");
        Ok(bytes)
    }
}
