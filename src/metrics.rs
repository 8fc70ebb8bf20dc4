use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing pipeline activity since startup.
#[derive(Default)]
pub struct PipelineMetrics {
    documents_summarized: AtomicU64,
    summary_failures: AtomicU64,
    chunks_processed: AtomicU64,
    chunk_failures: AtomicU64,
    terms_explained: AtomicU64,
    explanation_fallbacks: AtomicU64,
}

impl PipelineMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a summary that produced text, with the chunk outcome for chunked runs.
    pub fn record_summary(&self, chunks: u64, failed_chunks: u64) {
        self.documents_summarized.fetch_add(1, Ordering::Relaxed);
        self.chunks_processed.fetch_add(chunks, Ordering::Relaxed);
        self.chunk_failures
            .fetch_add(failed_chunks, Ordering::Relaxed);
    }

    /// Record a request that ended in an `Error:` payload.
    pub fn record_summary_failure(&self) {
        self.summary_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a term explanation; `fallback` when the safe sentence was returned instead.
    pub fn record_explanation(&self, fallback: bool) {
        self.terms_explained.fetch_add(1, Ordering::Relaxed);
        if fallback {
            self.explanation_fallbacks.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_summarized: self.documents_summarized.load(Ordering::Relaxed),
            summary_failures: self.summary_failures.load(Ordering::Relaxed),
            chunks_processed: self.chunks_processed.load(Ordering::Relaxed),
            chunk_failures: self.chunk_failures.load(Ordering::Relaxed),
            terms_explained: self.terms_explained.load(Ordering::Relaxed),
            explanation_fallbacks: self.explanation_fallbacks.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of pipeline counters used for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MetricsSnapshot {
    /// Summaries that returned text.
    pub documents_summarized: u64,
    /// Summaries that returned an `Error:` payload.
    pub summary_failures: u64,
    /// Chunks sent through strict extraction.
    pub chunks_processed: u64,
    /// Chunks whose extraction call failed and were marked inline.
    pub chunk_failures: u64,
    /// Term explanation requests, including empty input.
    pub terms_explained: u64,
    /// Explanations answered with the safe fallback sentence.
    pub explanation_fallbacks: u64,
}
