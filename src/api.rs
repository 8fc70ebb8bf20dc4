//! HTTP surface for Medlens.
//!
//! This module exposes a compact Axum router with a handful of endpoints:
//!
//! - `POST /summarize` – Summarize a stored document (`url` plus optional declared `kind`) or
//!   pasted `text` (exactly one of the two). Answers `200` with a `SummaryResult`; pipeline
//!   failures arrive as an `Error: <reason>` payload so clients can render them directly.
//! - `POST /explain` – Explain a medical term in two or three patient-friendly sentences.
//! - `GET /metrics` – Observe summary, chunk and explanation counters.
//! - `GET /commands` – Machine-readable command catalog for quick discovery by tools/hosts.
//!
//! The HTTP surface shares the same pipeline with the MCP server and the CLI, so behavior is
//! identical across interfaces.

use crate::extraction::{DocumentReference, MediaKind};
use crate::metrics::MetricsSnapshot;
use crate::processing::{PipelineApi, SummaryResult, SummarySource};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Build the HTTP router exposing the pipeline.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: PipelineApi + 'static,
{
    Router::new()
        .route("/summarize", post(summarize_document::<S>))
        .route("/explain", post(explain_term::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .with_state(service)
}

/// Request body for the `POST /summarize` endpoint.
#[derive(Deserialize)]
struct SummarizeRequest {
    /// Time-limited document URL issued by the storage collaborator.
    #[serde(default)]
    url: Option<String>,
    /// Declared media kind (`pdf`, `image`, a MIME type, ...).
    #[serde(default)]
    kind: Option<String>,
    /// Text pasted by the patient; used when no `url` is supplied.
    #[serde(default)]
    text: Option<String>,
}

impl SummarizeRequest {
    fn into_source(self) -> Result<SummarySource, AppError> {
        let declared = MediaKind::from_declared(self.kind.as_deref());
        let url = self.url.filter(|value| !value.trim().is_empty());
        let text = self.text.filter(|value| !value.trim().is_empty());
        match (url, text) {
            (Some(_), Some(_)) => Err(AppError::bad_request(
                "Provide either a document `url` or `text`, not both.",
            )),
            (Some(url), None) => Ok(SummarySource::Document(DocumentReference::new(
                url.trim(),
                declared,
            ))),
            (None, Some(text)) => Ok(SummarySource::Text(text)),
            (None, None) => Err(AppError::bad_request(
                "Provide either a document `url` or non-empty `text`.",
            )),
        }
    }
}

/// Summarize a document or pasted text.
async fn summarize_document<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<SummarizeRequest>,
) -> Result<Json<SummaryResult>, AppError>
where
    S: PipelineApi,
{
    let source = request.into_source()?;
    let result = service.summarize(source).await;
    tracing::info!(
        request_id = %result.request_id,
        mode = ?result.mode,
        chunks = result.chunk_count,
        failed_chunks = result.failed_chunks,
        error = result.is_error(),
        "Summarize request completed"
    );
    Ok(Json(result))
}

/// Request body for the `POST /explain` endpoint.
#[derive(Deserialize)]
struct ExplainRequest {
    #[serde(default)]
    term: String,
}

/// Response body for the `POST /explain` endpoint.
#[derive(Serialize)]
struct ExplainResponse {
    explanation: String,
}

/// Explain a term; empty input and provider failures yield fixed sentences, never errors.
async fn explain_term<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<ExplainRequest>,
) -> Json<ExplainResponse>
where
    S: PipelineApi,
{
    let explanation = service.explain(&request.term).await;
    Json(ExplainResponse { explanation })
}

/// Return the pipeline counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsSnapshot>
where
    S: PipelineApi,
{
    Json(service.metrics_snapshot())
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery/UX in hosts and tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "summarize",
                method: "POST",
                path: "/summarize",
                description: "Summarize a medical document (PDF or image URL) or pasted text for a patient. Response is a SummaryResult whose `text` starts with \"Error:\" when the request failed.",
                request_example: Some(json!({
                    "url": "https://storage.example/reports/cbc.pdf?token=...",
                    "kind": "pdf"
                })),
            },
            CommandDescriptor {
                name: "explain",
                method: "POST",
                path: "/explain",
                description: "Explain a medical term in 2-3 patient-friendly sentences without diagnosis or advice.",
                request_example: Some(json!({ "term": "hemoglobin" })),
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return summary, chunk and explanation counters useful for observability dashboards.",
                request_example: None,
            },
        ],
    })
}

struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
