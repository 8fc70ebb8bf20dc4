//! Handler for the metrics tool.

use std::sync::Arc;

use crate::processing::PipelineApi;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use serde_json::json;

/// Handle the `metrics` tool, returning the current pipeline counters.
pub(crate) async fn handle_metrics(
    pipeline: &Arc<dyn PipelineApi>,
) -> Result<CallToolResult, McpError> {
    let snapshot = pipeline.metrics_snapshot();
    Ok(CallToolResult::structured(json!({
        "documentsSummarized": snapshot.documents_summarized,
        "summaryFailures": snapshot.summary_failures,
        "chunksProcessed": snapshot.chunks_processed,
        "chunkFailures": snapshot.chunk_failures,
        "termsExplained": snapshot.terms_explained,
        "explanationFallbacks": snapshot.explanation_fallbacks,
    })))
}
