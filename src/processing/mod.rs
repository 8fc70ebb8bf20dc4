//! Summarization pipeline: cleaning, chunking, prompting and orchestration.

pub mod chunking;
pub mod cleaning;
pub mod explain;
pub mod prompts;
mod service;
#[cfg(test)]
pub(crate) mod testing;
pub mod types;

pub use explain::{EMPTY_TERM_MESSAGE, EXPLANATION_FALLBACK, Explanation, TermExplainer};
pub use service::{
    MedicalPipeline, NO_TEXT_REASON, PipelineApi, RESPONSE_RESERVE_TOKENS,
    SummarizationOrchestrator, SummarizationSettings,
};
pub use types::{
    ChunkingError, ExplainError, PipelineProfile, SummaryMode, SummaryResult, SummarySource,
};
