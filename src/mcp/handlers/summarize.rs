//! Handler for the `summarize-document` MCP tool.

use std::sync::Arc;

use crate::{
    extraction::{DocumentReference, MediaKind},
    mcp::{format::summary_payload, handlers::parse_arguments},
    processing::{PipelineApi, SummarySource},
};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, JsonObject},
};
use serde::Deserialize;

/// Raw request payload accepted from MCP clients.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SummarizeToolRequest {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

/// Handle the `summarize-document` tool invocation.
///
/// Pipeline failures are not MCP errors: they come back as a structured result whose `text`
/// starts with `Error:` and whose `isError` flag is set, so hosts can show them verbatim.
pub(crate) async fn handle_summarize(
    pipeline: &Arc<dyn PipelineApi>,
    arguments: Option<JsonObject>,
) -> Result<CallToolResult, McpError> {
    let args: SummarizeToolRequest = parse_arguments(arguments)?;
    let source = resolve_source(args)?;

    let result = pipeline.summarize(source).await;
    let payload = summary_payload(&result);
    if result.is_error() {
        Ok(CallToolResult::structured_error(payload))
    } else {
        Ok(CallToolResult::structured(payload))
    }
}

fn resolve_source(args: SummarizeToolRequest) -> Result<SummarySource, McpError> {
    let url = args.url.filter(|value| !value.trim().is_empty());
    let text = args.text.filter(|value| !value.trim().is_empty());
    match (url, text) {
        (Some(_), Some(_)) => Err(McpError::invalid_params(
            "Provide either `url` or `text`, not both",
            None,
        )),
        (Some(url), None) => Ok(SummarySource::Document(DocumentReference::new(
            url.trim(),
            MediaKind::from_declared(args.kind.as_deref()),
        ))),
        (None, Some(text)) => Ok(SummarySource::Text(text)),
        (None, None) => Err(McpError::invalid_params(
            "A document `url` or non-empty `text` is required",
            None,
        )),
    }
}
