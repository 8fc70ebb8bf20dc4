//! Formatting helpers shared across MCP handlers and resources.

use crate::processing::{PipelineProfile, SummaryResult};
use rmcp::model::ResourceContents;
use schemars::JsonSchema;
use serde::Serialize;
use serde_json::{Map, Value, json};

pub(crate) const APPLICATION_JSON: &str = "application/json";

/// Settings snapshot returned by the `settings` resource.
#[derive(Debug, Serialize, JsonSchema)]
pub(crate) struct SettingsSnapshot {
    /// Effective pipeline configuration (credentials are never included).
    pub(crate) pipeline: PipelineProfile,
    /// Crate version serving the request.
    pub(crate) version: &'static str,
}

/// Static usage guide returned by the `usage` resource.
pub(crate) fn usage_payload() -> Value {
    json!({
        "title": "Medlens MCP Usage",
        "policy": [
            "Pass the storage URL of the report; do not paste whole documents into prompts when a URL exists.",
            "Declare `kind` when the URL has no .pdf suffix but points at a PDF.",
            "Render `text` as-is: failures already arrive as a single `Error: ...` sentence.",
            "Summaries never diagnose; keep the closing disclaimer when relaying them.",
            "Use explain-term for single words or short phrases, not whole sentences."
        ],
        "flows": [
            {
                "name": "Summarize a report",
                "steps": [
                    "summarize-document({ url, kind? })",
                    "explain-term({ term }) for unfamiliar words in the summary"
                ]
            },
            {
                "name": "Scanned PDF without a text layer",
                "steps": [
                    "summarize-document returns an Error payload recommending an image upload",
                    "summarize-document({ url: <image url>, kind: \"image\" }) or ({ text })"
                ]
            }
        ]
    })
}

/// Structured payload for a summary tool result.
pub(crate) fn summary_payload(result: &SummaryResult) -> Value {
    let mut payload = Map::new();
    payload.insert("text".into(), Value::String(result.text.clone()));
    payload.insert("isError".into(), Value::Bool(result.is_error()));
    if let Some(mode) = result.mode {
        payload.insert("mode".into(), Value::String(mode.to_string()));
    }
    payload.insert("chunkCount".into(), json!(result.chunk_count));
    payload.insert("failedChunks".into(), json!(result.failed_chunks));
    payload.insert(
        "requestId".into(),
        Value::String(result.request_id.to_string()),
    );
    payload.insert(
        "generatedAt".into(),
        Value::String(result.generated_at.clone()),
    );
    Value::Object(payload)
}

/// Serialize a value to JSON, falling back to compact formatting on error.
pub(crate) fn serialize_json<T: Serialize>(value: &T, context_uri: &str) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|error| {
        tracing::warn!(uri = context_uri, %error, "Failed to serialize JSON prettily");
        serde_json::to_string(value).unwrap_or_else(|_| "{}".into())
    })
}

/// Build JSON resource contents for MCP resource responses.
pub(crate) fn json_resource_contents(uri: &str, text: String) -> ResourceContents {
    ResourceContents::TextResourceContents {
        uri: uri.to_string(),
        mime_type: Some(APPLICATION_JSON.into()),
        text,
        meta: None,
    }
}
