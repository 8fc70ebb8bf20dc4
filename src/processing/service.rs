//! Summarization orchestration and the pipeline facade shared by the HTTP, MCP and CLI surfaces.

use crate::{
    config::{Config, PipelineSettings},
    extraction::DocumentExtractor,
    llm::{LanguageModelProvider, ProviderError, build_provider},
    metrics::{MetricsSnapshot, PipelineMetrics},
    processing::{
        chunking::chunk,
        cleaning::clean,
        explain::{Explanation, TermExplainer},
        prompts::PromptSpec,
        types::{PipelineProfile, SummaryMode, SummaryResult, SummarySource},
    },
};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tiktoken_rs::{CoreBPE, cl100k_base};
use tracing::Instrument;
use uuid::Uuid;

/// Reason reported when neither the document nor the caller supplied any usable text.
pub const NO_TEXT_REASON: &str = "No text available for extraction";

/// Tokens kept free for the model's answer when deciding whether a prompt fits.
pub const RESPONSE_RESERVE_TOKENS: usize = 1024;

static ENCODING: LazyLock<Option<CoreBPE>> = LazyLock::new(|| match cl100k_base() {
    Ok(encoding) => Some(encoding),
    Err(error) => {
        tracing::warn!(%error, "Tokenizer unavailable; estimating tokens from characters");
        None
    }
});

/// Approximate the prompt's token count. Falls back to one token per four characters.
pub(crate) fn estimate_tokens(text: &str) -> usize {
    match ENCODING.as_ref() {
        Some(encoding) => encoding.encode_ordinary(text).len(),
        None => text.chars().count().div_ceil(4),
    }
}

/// Hex SHA-256 of the text, used to correlate log lines without logging content.
pub(crate) fn fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Knobs that shape one summarization run.
#[derive(Debug, Clone)]
pub struct SummarizationSettings {
    /// Mode selection policy.
    pub mode: SummaryMode,
    /// Maximum characters per chunk in strict-extraction mode.
    pub chunk_size: usize,
    /// Pause before every chunk call except the first.
    pub chunk_delay: Duration,
    /// Temperature for the single-shot patient summary.
    pub summary_temperature: f32,
    /// Temperature for strict extraction.
    pub extraction_temperature: f32,
}

impl SummarizationSettings {
    /// Derive settings from the loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::from_parts(config.provider.temperature, &config.pipeline)
    }

    fn from_parts(summary_temperature: f32, pipeline: &PipelineSettings) -> Self {
        Self {
            mode: pipeline.summary_mode,
            chunk_size: pipeline.chunk_size,
            chunk_delay: pipeline.chunk_delay,
            summary_temperature,
            extraction_temperature: pipeline.extraction_temperature,
        }
    }
}

/// Drives extraction, chunking and provider calls to produce a [`SummaryResult`].
///
/// Every outcome, including total failure, is returned as a renderable `SummaryResult`; this
/// type never returns an error across its API.
#[derive(Clone)]
pub struct SummarizationOrchestrator {
    extractor: DocumentExtractor,
    provider: Arc<dyn LanguageModelProvider>,
    settings: SummarizationSettings,
    metrics: Arc<PipelineMetrics>,
}

enum Outcome {
    Done {
        text: String,
        mode: SummaryMode,
        chunk_count: usize,
        failed_chunks: usize,
    },
    Failed(String),
}

impl SummarizationOrchestrator {
    /// Assemble an orchestrator from its collaborators.
    pub fn new(
        extractor: DocumentExtractor,
        provider: Arc<dyn LanguageModelProvider>,
        settings: SummarizationSettings,
    ) -> Self {
        Self {
            extractor,
            provider,
            settings,
            metrics: Arc::new(PipelineMetrics::new()),
        }
    }

    /// Record outcomes into a shared metrics registry.
    pub fn with_metrics(mut self, metrics: Arc<PipelineMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Summarize a document or caller-supplied text.
    pub async fn summarize(&self, source: SummarySource) -> SummaryResult {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "summarize",
            %request_id,
            provider = self.provider.name(),
            fingerprint = tracing::field::Empty,
        );
        let outcome = self.run(source).instrument(span).await;

        match outcome {
            Outcome::Done {
                text,
                mode,
                chunk_count,
                failed_chunks,
            } => {
                let processed = if mode == SummaryMode::Chunked {
                    chunk_count as u64
                } else {
                    0
                };
                self.metrics
                    .record_summary(processed, failed_chunks as u64);
                SummaryResult::success(request_id, text, mode, chunk_count, failed_chunks)
            }
            Outcome::Failed(reason) => {
                self.metrics.record_summary_failure();
                tracing::warn!(%request_id, "Summary request failed");
                SummaryResult::failure(request_id, reason)
            }
        }
    }

    async fn run(&self, source: SummarySource) -> Outcome {
        // A missing credential must not cost a download or an OCR run.
        if let Err(error) = self.provider.check_ready() {
            tracing::error!(error = %error, "Provider not ready");
            return Outcome::Failed(error.to_string());
        }

        let text = match source {
            SummarySource::Document(reference) => match self.extractor.extract(&reference).await {
                Ok(extracted) => extracted.cleaned,
                Err(error) => return Outcome::Failed(error.to_string()),
            },
            SummarySource::Text(raw) => clean(&raw),
        };

        if text.trim().is_empty() {
            return Outcome::Failed(NO_TEXT_REASON.to_string());
        }
        tracing::Span::current().record("fingerprint", fingerprint(&text).as_str());

        match self.select_mode(&text) {
            SummaryMode::Chunked => self.summarize_chunked(&text).await,
            _ => self.summarize_single(&text).await,
        }
    }

    /// Resolve `Auto` against the provider's context window.
    pub(crate) fn select_mode(&self, text: &str) -> SummaryMode {
        match self.settings.mode {
            SummaryMode::Auto => {
                let prompt = PromptSpec::patient_summary(text, self.provider.name()).render();
                let needed = estimate_tokens(&prompt) + RESPONSE_RESERVE_TOKENS;
                let window = self.provider.context_window();
                let mode = if needed <= window {
                    SummaryMode::SingleShot
                } else {
                    SummaryMode::Chunked
                };
                tracing::debug!(needed, window, mode = %mode, "Selected summary mode");
                mode
            }
            fixed => fixed,
        }
    }

    async fn summarize_single(&self, text: &str) -> Outcome {
        let prompt = PromptSpec::patient_summary(text, self.provider.name());
        tracing::info!(chars = text.chars().count(), "Generating single-shot summary");
        match self
            .provider
            .generate(&prompt.render(), self.settings.summary_temperature)
            .await
        {
            Ok(summary) => Outcome::Done {
                text: summary,
                mode: SummaryMode::SingleShot,
                chunk_count: 1,
                failed_chunks: 0,
            },
            Err(error) => {
                tracing::error!(error = %error, "Single-shot summary failed");
                Outcome::Failed(error.to_string())
            }
        }
    }

    /// Sequential strict extraction. Chunk N+1 is only requested after chunk N has completed
    /// and the configured delay has elapsed.
    async fn summarize_chunked(&self, text: &str) -> Outcome {
        let chunks = match chunk(text, self.settings.chunk_size) {
            Ok(chunks) => chunks,
            Err(error) => return Outcome::Failed(error.to_string()),
        };
        let total = chunks.len();
        tracing::info!(chunks = total, chunk_size = self.settings.chunk_size, "Starting strict extraction");

        let mut sections = Vec::with_capacity(total);
        let mut failed_chunks = 0;
        for piece in &chunks {
            if piece.index > 0 && !self.settings.chunk_delay.is_zero() {
                tokio::time::sleep(self.settings.chunk_delay).await;
            }

            let prompt =
                PromptSpec::chunk_extraction(&piece.content, piece.index, total, self.provider.name());
            match self
                .provider
                .generate(&prompt.render(), self.settings.extraction_temperature)
                .await
            {
                Ok(extracted) => sections.push(extracted.trim().to_string()),
                Err(error) if error.is_fatal() => {
                    tracing::error!(error = %error, chunk = piece.index, "Aborting strict extraction");
                    return Outcome::Failed(error.to_string());
                }
                Err(error) => {
                    tracing::warn!(error = %error, chunk = piece.index, "Chunk extraction failed");
                    failed_chunks += 1;
                    sections.push(chunk_failure_marker(piece.index, total, &error));
                }
            }
        }

        Outcome::Done {
            text: sections.join("\n\n"),
            mode: SummaryMode::Chunked,
            chunk_count: total,
            failed_chunks,
        }
    }
}

/// Inline marker standing in for a chunk whose extraction failed.
pub(crate) fn chunk_failure_marker(index: usize, total: usize, error: &ProviderError) -> String {
    format!(
        "[Section {} of {}: extraction failed - {}]",
        index + 1,
        total,
        error
    )
}

/// Abstraction over the pipeline used by external surfaces (HTTP, MCP, CLI).
#[async_trait]
pub trait PipelineApi: Send + Sync {
    /// Summarize a document or raw text. Never fails; errors arrive as `Error:` payloads.
    async fn summarize(&self, source: SummarySource) -> SummaryResult;

    /// Explain a medical term in patient-friendly language. Never fails.
    async fn explain(&self, term: &str) -> String;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;

    /// Effective configuration, without credentials.
    fn profile(&self) -> PipelineProfile;
}

/// Production pipeline: extraction, orchestration and term explanation over one provider.
///
/// Construct once near process start and share it through an `Arc`.
pub struct MedicalPipeline {
    orchestrator: SummarizationOrchestrator,
    explainer: TermExplainer,
    metrics: Arc<PipelineMetrics>,
    profile: PipelineProfile,
}

impl MedicalPipeline {
    /// Build the pipeline selected by `config`.
    pub fn new(config: &Config) -> Self {
        let provider = build_provider(&config.provider);
        tracing::info!(
            provider = provider.name(),
            model = %config.provider.model,
            mode = %config.pipeline.summary_mode,
            "Pipeline initialized"
        );
        let profile = PipelineProfile {
            provider: config.provider.kind.label().to_string(),
            model: config.provider.model.clone(),
            context_window: config.provider.context_window,
            summary_mode: config.pipeline.summary_mode,
            chunk_size: config.pipeline.chunk_size,
            chunk_delay_ms: config.pipeline.chunk_delay.as_millis() as u64,
            ocr_language: config.pipeline.ocr_language.clone(),
        };
        Self::from_parts(
            DocumentExtractor::from_settings(&config.pipeline),
            provider,
            SummarizationSettings::from_config(config),
            config.pipeline.explain_temperature,
            profile,
        )
    }

    /// Assemble the pipeline from explicit collaborators.
    pub fn from_parts(
        extractor: DocumentExtractor,
        provider: Arc<dyn LanguageModelProvider>,
        settings: SummarizationSettings,
        explain_temperature: f32,
        profile: PipelineProfile,
    ) -> Self {
        let metrics = Arc::new(PipelineMetrics::new());
        Self {
            orchestrator: SummarizationOrchestrator::new(extractor, Arc::clone(&provider), settings)
                .with_metrics(Arc::clone(&metrics)),
            explainer: TermExplainer::new(provider, explain_temperature),
            metrics,
            profile,
        }
    }
}

#[async_trait]
impl PipelineApi for MedicalPipeline {
    async fn summarize(&self, source: SummarySource) -> SummaryResult {
        self.orchestrator.summarize(source).await
    }

    async fn explain(&self, term: &str) -> String {
        let Explanation { text, fallback } = self.explainer.answer(term).await;
        self.metrics.record_explanation(fallback);
        text
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    fn profile(&self) -> PipelineProfile {
        self.profile.clone()
    }
}
