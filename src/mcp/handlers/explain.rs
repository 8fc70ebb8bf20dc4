//! Handler for the `explain-term` MCP tool.

use std::sync::Arc;

use crate::{mcp::handlers::parse_arguments, processing::PipelineApi};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, JsonObject},
};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ExplainToolRequest {
    #[serde(default)]
    term: String,
}

/// Handle the `explain-term` tool. Empty terms and provider failures yield fixed sentences.
pub(crate) async fn handle_explain(
    pipeline: &Arc<dyn PipelineApi>,
    arguments: Option<JsonObject>,
) -> Result<CallToolResult, McpError> {
    let args: ExplainToolRequest = parse_arguments(arguments)?;
    let explanation = pipeline.explain(&args.term).await;
    Ok(CallToolResult::structured(json!({
        "explanation": explanation,
    })))
}
