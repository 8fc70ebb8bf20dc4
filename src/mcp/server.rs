//! MCP server bootstrap and request dispatch.

use std::{borrow::Cow, sync::Arc};

use crate::{
    mcp::{
        format::{SettingsSnapshot, json_resource_contents, serialize_json, usage_payload},
        handlers::{
            explain::handle_explain, metrics::handle_metrics, summarize::handle_summarize,
        },
        registry, schemas,
    },
    processing::PipelineApi,
};
use rmcp::{
    ErrorData as McpError,
    handler::server::ServerHandler,
    model::{
        AnnotateAble, CallToolRequestParam, CallToolResult, ListResourceTemplatesResult,
        ListResourcesResult, ListToolsResult, RawResource, ReadResourceRequestParam,
        ReadResourceResult, Resource, ServerCapabilities, ServerInfo, Tool, ToolAnnotations,
    },
};

const SETTINGS_URI: &str = "mcp://settings";
const USAGE_URI: &str = "mcp://usage";

/// Tool name for document summarization.
pub const SUMMARIZE_TOOL: &str = "summarize-document";
/// Tool name for term explanations.
pub const EXPLAIN_TOOL: &str = "explain-term";
/// Tool name for the counters snapshot.
pub const METRICS_TOOL: &str = "metrics";

/// MCP server implementation exposing the Medlens pipeline.
#[derive(Clone)]
pub struct MedlensMcpServer {
    pipeline: Arc<dyn PipelineApi>,
    registry: Arc<registry::Registry>,
}

impl MedlensMcpServer {
    /// Create a new MCP server around the supplied pipeline.
    pub fn new(pipeline: Arc<dyn PipelineApi>) -> Self {
        let mut registry = registry::Registry::new();
        registry.register_resource(SETTINGS_URI, resource_settings);
        registry.register_resource(USAGE_URI, resource_usage);

        registry.register_tool(SUMMARIZE_TOOL, tool_summarize);
        registry.register_tool(EXPLAIN_TOOL, tool_explain);
        registry.register_tool(METRICS_TOOL, tool_metrics);

        Self {
            pipeline,
            registry: Arc::new(registry),
        }
    }

    fn describe_tools(&self) -> Vec<Tool> {
        vec![
            Tool {
                name: Cow::Borrowed(SUMMARIZE_TOOL),
                title: Some("Summarize Medical Document".to_string()),
                description: Some(Cow::Borrowed(
                    "Turn a lab report, prescription or discharge note (PDF/image URL or pasted text) into a short patient-friendly summary. Never diagnoses.",
                )),
                input_schema: Arc::new(schemas::summarize_input_schema()),
                output_schema: None,
                annotations: Some(
                    ToolAnnotations::with_title("Summarize Medical Document")
                        .read_only(true)
                        .idempotent(false)
                        .open_world(true),
                ),
                icons: None,
            },
            Tool {
                name: Cow::Borrowed(EXPLAIN_TOOL),
                title: Some("Explain Medical Term".to_string()),
                description: Some(Cow::Borrowed(
                    "Explain a medical term in two or three plain sentences a patient can follow.",
                )),
                input_schema: Arc::new(schemas::explain_input_schema()),
                output_schema: None,
                annotations: Some(
                    ToolAnnotations::with_title("Explain Medical Term")
                        .read_only(true)
                        .idempotent(true)
                        .open_world(true),
                ),
                icons: None,
            },
            Tool {
                name: Cow::Borrowed(METRICS_TOOL),
                title: Some("Metrics Snapshot".to_string()),
                description: Some(Cow::Borrowed(
                    "Check summary, chunk and explanation counters at a glance.",
                )),
                input_schema: Arc::new(schemas::empty_object_schema()),
                output_schema: None,
                annotations: Some(
                    ToolAnnotations::with_title("Metrics Snapshot")
                        .read_only(true)
                        .idempotent(true)
                        .open_world(false),
                ),
                icons: None,
            },
        ]
    }

    fn describe_resources(&self) -> Vec<Resource> {
        let mut settings = RawResource::new(SETTINGS_URI, "settings");
        settings.description =
            Some("Active provider, model and summarization defaults (no credentials)".into());

        let mut usage = RawResource::new(USAGE_URI, "usage");
        usage.description = Some(
            "Recommended tool flow: summarize-document, then explain-term for unfamiliar words."
                .into(),
        );

        vec![settings.no_annotation(), usage.no_annotation()]
    }
}

fn resource_settings(
    server: &MedlensMcpServer,
    _request: ReadResourceRequestParam,
) -> registry::ResourceFuture {
    let payload = SettingsSnapshot {
        pipeline: server.pipeline.profile(),
        version: env!("CARGO_PKG_VERSION"),
    };
    Box::pin(async move {
        Ok(ReadResourceResult {
            contents: vec![json_resource_contents(
                SETTINGS_URI,
                serialize_json(&payload, SETTINGS_URI),
            )],
        })
    })
}

fn resource_usage(
    _server: &MedlensMcpServer,
    _request: ReadResourceRequestParam,
) -> registry::ResourceFuture {
    Box::pin(async move {
        Ok(ReadResourceResult {
            contents: vec![json_resource_contents(
                USAGE_URI,
                serialize_json(&usage_payload(), USAGE_URI),
            )],
        })
    })
}

fn tool_summarize(server: &MedlensMcpServer, request: CallToolRequestParam) -> registry::ToolFuture {
    let pipeline = server.pipeline.clone();
    Box::pin(async move { handle_summarize(&pipeline, request.arguments).await })
}

fn tool_explain(server: &MedlensMcpServer, request: CallToolRequestParam) -> registry::ToolFuture {
    let pipeline = server.pipeline.clone();
    Box::pin(async move { handle_explain(&pipeline, request.arguments).await })
}

fn tool_metrics(server: &MedlensMcpServer, _request: CallToolRequestParam) -> registry::ToolFuture {
    let pipeline = server.pipeline.clone();
    Box::pin(async move { handle_metrics(&pipeline).await })
}

impl ServerHandler for MedlensMcpServer {
    fn get_info(&self) -> ServerInfo {
        let mut implementation = rmcp::model::Implementation::from_build_env();
        implementation.name = "medlens".to_string();
        implementation.title = Some("Medlens MCP".to_string());
        implementation.version = env!("CARGO_PKG_VERSION").to_string();

        ServerInfo {
            capabilities: ServerCapabilities::builder()
                .enable_resources()
                .enable_tools()
                .build(),
            server_info: implementation,
            instructions: Some(
                "Use this server to summarize patients' medical documents in plain language and to explain medical terms. Results are informational only: relay the closing disclaimer and never present them as a diagnosis.".into(),
            ),
            ..ServerInfo::default()
        }
    }

    fn list_resources(
        &self,
        _request: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListResourcesResult, McpError>> + Send + '_ {
        let resources = self.describe_resources();
        std::future::ready(Ok(ListResourcesResult::with_all_items(resources)))
    }

    fn list_resource_templates(
        &self,
        _request: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListResourceTemplatesResult, McpError>> + Send + '_
    {
        std::future::ready(Ok(ListResourceTemplatesResult::with_all_items(Vec::new())))
    }

    fn list_tools(
        &self,
        _request: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        let tools = self.describe_tools();
        std::future::ready(Ok(ListToolsResult::with_all_items(tools)))
    }

    #[allow(clippy::manual_async_fn)]
    fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ReadResourceResult, McpError>> + Send + '_ {
        async move {
            if let Some(handler) = self.registry.resources.get(request.uri.as_str()) {
                return handler(self, request).await;
            }

            Err(McpError::invalid_params(
                format!("Unknown resource URI: {}", request.uri),
                None,
            ))
        }
    }

    #[allow(clippy::manual_async_fn)]
    fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move {
            if let Some(handler) = self.registry.tools.get(request.name.as_ref()) {
                return handler(self, request).await;
            }

            Err(McpError::invalid_params(
                format!("Unknown tool: {}", request.name),
                None,
            ))
        }
    }
}
