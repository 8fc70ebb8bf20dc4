//! Core data types and error definitions for the summarization pipeline.

use crate::extraction::DocumentReference;
use crate::llm::ProviderError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use uuid::Uuid;

/// Errors produced while partitioning text into chunks.
#[derive(Debug, Error)]
pub enum ChunkingError {
    /// Caller configured an impossible window size.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
}

/// Errors raised by the term explanation path before they are turned into a safe sentence.
#[derive(Debug, Error)]
pub enum ExplainError {
    /// The user supplied an empty or whitespace-only term.
    #[error("no medical term was provided")]
    EmptyInput,
    /// The configured provider failed to answer.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// How a summary is produced from cleaned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SummaryMode {
    /// Pick single-shot when the whole prompt fits the provider context, chunked otherwise.
    Auto,
    /// One safety-constrained patient summary prompt carrying the full document.
    SingleShot,
    /// Sequential, low-temperature extraction prompts, one per chunk.
    Chunked,
}

impl std::str::FromStr for SummaryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "single" | "single_shot" | "single-shot" => Ok(Self::SingleShot),
            "chunked" | "strict" | "extraction" => Ok(Self::Chunked),
            other => Err(format!("unknown summary mode '{other}'")),
        }
    }
}

impl std::fmt::Display for SummaryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Auto => "auto",
            Self::SingleShot => "single_shot",
            Self::Chunked => "chunked",
        };
        f.write_str(label)
    }
}

/// Input accepted by the orchestrator.
#[derive(Debug, Clone)]
pub enum SummarySource {
    /// A fetchable document supplied by the storage collaborator.
    Document(DocumentReference),
    /// Text the caller already has (pasted by the patient or extracted elsewhere).
    Text(String),
}

/// Outcome of one summarization request.
///
/// `text` is always renderable: on total failure it holds `Error: <reason>` and `error`
/// carries the bare reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryResult {
    /// Summary (single-shot) or concatenated extraction bullets (chunked).
    pub text: String,
    /// Reason the request failed as a whole, if it did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Mode actually used; absent when the request failed before a mode was chosen.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<SummaryMode>,
    /// Number of provider prompts the document was split into.
    pub chunk_count: usize,
    /// Number of chunks whose provider call failed and were recorded inline.
    pub failed_chunks: usize,
    /// Correlation identifier shared with the request's log lines.
    pub request_id: Uuid,
    /// RFC 3339 timestamp of completion.
    pub generated_at: String,
}

impl SummaryResult {
    /// Successful outcome; `text` is trimmed.
    pub fn success(
        request_id: Uuid,
        text: String,
        mode: SummaryMode,
        chunk_count: usize,
        failed_chunks: usize,
    ) -> Self {
        Self {
            text: text.trim().to_string(),
            error: None,
            mode: Some(mode),
            chunk_count,
            failed_chunks,
            request_id,
            generated_at: now_rfc3339(),
        }
    }

    /// Total failure rendered as `Error: <reason>`.
    pub fn failure(request_id: Uuid, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            text: format!("Error: {reason}"),
            error: Some(reason),
            mode: None,
            chunk_count: 0,
            failed_chunks: 0,
            request_id,
            generated_at: now_rfc3339(),
        }
    }

    /// Whether the request failed as a whole.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Effective pipeline configuration exposed to clients. Never includes credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PipelineProfile {
    /// Provider variant label (`keyed`, `chat`, `local`).
    pub provider: String,
    /// Model identifier sent to the provider.
    pub model: String,
    /// Context window budget in tokens.
    pub context_window: usize,
    /// Configured mode selection policy.
    pub summary_mode: SummaryMode,
    /// Maximum characters per strict-extraction chunk.
    pub chunk_size: usize,
    /// Pause between chunk calls, in milliseconds.
    pub chunk_delay_ms: u64,
    /// OCR language code.
    pub ocr_language: String,
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}
