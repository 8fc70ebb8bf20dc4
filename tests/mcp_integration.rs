use std::sync::{Arc, Once};

use httpmock::{Method::GET, Method::POST, MockServer};
use medlens::{
    config::Config,
    logging,
    mcp::{EXPLAIN_TOOL, METRICS_TOOL, MedlensMcpServer, SUMMARIZE_TOOL},
    processing::{EMPTY_TERM_MESSAGE, MedicalPipeline},
};
use rmcp::{
    handler::client::ClientHandler,
    model::{self, CallToolRequestParam, ClientInfo, PaginatedRequestParam, ReadResourceRequestParam},
    service::{RoleClient, RoleServer, RunningService, Service, serve_directly},
    transport::async_rw::AsyncRwTransport,
};
use serde_json::{Value, json};
use tokio::io::split;

static TRACING: Once = Once::new();

#[derive(Clone, Default)]
struct DummyClientHandler;

impl ClientHandler for DummyClientHandler {
    fn get_info(&self) -> ClientInfo {
        ClientInfo::default()
    }
}

struct TestHarness {
    service: RunningService<RoleClient, DummyClientHandler>,
    server: RunningService<RoleServer, MedlensMcpServer>,
}

impl TestHarness {
    /// Start an MCP client/server pair over an in-memory duplex, backed by a local model
    /// service mocked at `model_server`.
    async fn new(model_server: &MockServer) -> Self {
        TRACING.call_once(logging::init_tracing_stderr);

        let endpoint = model_server.base_url();
        let config = Config::from_lookup(|key| match key {
            "LLM_PROVIDER" => Some("local".into()),
            "LLM_ENDPOINT" => Some(endpoint.clone()),
            "LLM_MODEL" => Some("llama3.2".into()),
            "CHUNK_DELAY_MS" => Some("0".into()),
            _ => None,
        })
        .expect("test configuration");
        let server = MedlensMcpServer::new(Arc::new(MedicalPipeline::new(&config)));

        let (client_stream, server_stream) = tokio::io::duplex(64 * 1024);
        let (client_read, client_write) = split(client_stream);
        let (server_read, server_write) = split(server_stream);

        let client_transport = AsyncRwTransport::new_client(client_read, client_write);
        let server_transport = AsyncRwTransport::new_server(server_read, server_write);

        let server_info = server.get_info();
        let client_handler = DummyClientHandler;
        let client_info = ClientHandler::get_info(&client_handler);

        let server =
            serve_directly::<RoleServer, _, _, _, _>(server, server_transport, Some(client_info));
        let service = serve_directly::<RoleClient, _, _, _, _>(
            client_handler,
            client_transport,
            Some(server_info),
        );

        Self { service, server }
    }

    async fn call(&self, name: &str, arguments: Value) -> model::CallToolResult {
        self.service
            .call_tool(CallToolRequestParam {
                name: name.to_string().into(),
                arguments: arguments.as_object().cloned(),
            })
            .await
            .expect("tool call")
    }

    async fn shutdown(self) {
        let Self { service, server } = self;
        let _ = service.cancel().await;
        let _ = server.cancel().await;
    }
}

fn blank_pdf() -> Vec<u8> {
    use lopdf::{Document, Object, Stream, dictionary};

    let mut doc = Document::with_version("1.4");
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        },
    });
    let pages_id = doc.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
    });
    if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(page_id) {
        dict.set("Parent", pages_id);
    }
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("serialize pdf");
    buf
}

#[tokio::test]
async fn initialize_and_list_tools() {
    let model_server = MockServer::start_async().await;
    let harness = TestHarness::new(&model_server).await;
    let service = &harness.service;

    let info = service
        .peer_info()
        .expect("server info should be initialized");
    assert_eq!(info.server_info.name, "medlens");
    assert!(info.capabilities.tools.is_some());
    assert!(info.capabilities.resources.is_some());

    let tools_result = service
        .list_tools(Some(PaginatedRequestParam { cursor: None }))
        .await
        .expect("list_tools");
    let names: Vec<_> = tools_result
        .tools
        .iter()
        .map(|tool| tool.name.as_ref())
        .collect();
    assert!(names.contains(&SUMMARIZE_TOOL));
    assert!(names.contains(&EXPLAIN_TOOL));
    assert!(names.contains(&METRICS_TOOL));

    harness.shutdown().await;
}

#[tokio::test]
async fn summarize_text_reaches_the_model_and_updates_metrics() {
    let model_server = MockServer::start_async().await;
    let generate = model_server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/generate")
                .body_contains("Hemoglobin");
            then.status(200).json_body(json!({
                "response": "  - Hemoglobin is 9.1 g/dL, which the report marks as low.  ",
                "done": true
            }));
        })
        .await;
    let harness = TestHarness::new(&model_server).await;

    let response = harness
        .call(
            SUMMARIZE_TOOL,
            json!({ "text": "Hemoglobin 9.1 g/dL (Low)\nPage 1 of 1" }),
        )
        .await;
    assert_eq!(response.is_error, Some(false));
    let payload = response.structured_content.expect("structured payload");
    assert_eq!(
        payload["text"],
        "- Hemoglobin is 9.1 g/dL, which the report marks as low."
    );
    assert_eq!(payload["mode"], "single_shot");
    assert_eq!(payload["isError"], false);
    generate.assert_async().await;

    let metrics = harness.call(METRICS_TOOL, json!({})).await;
    let metrics = metrics.structured_content.expect("metrics payload");
    assert_eq!(metrics["documentsSummarized"], 1);
    assert_eq!(metrics["summaryFailures"], 0);

    harness.shutdown().await;
}

#[tokio::test]
async fn scanned_pdf_is_reported_without_calling_the_model() {
    let model_server = MockServer::start_async().await;
    let generate = model_server
        .mock_async(|when, then| {
            when.method(POST).path("/api/generate");
            then.status(200)
                .json_body(json!({ "response": "unexpected", "done": true }));
        })
        .await;
    let document = model_server
        .mock_async(|when, then| {
            when.method(GET).path("/reports/scan.pdf");
            then.status(200)
                .header("content-type", "application/pdf")
                .body(blank_pdf());
        })
        .await;
    let harness = TestHarness::new(&model_server).await;

    let response = harness
        .call(
            SUMMARIZE_TOOL,
            json!({ "url": model_server.url("/reports/scan.pdf") }),
        )
        .await;
    assert_eq!(response.is_error, Some(true));
    let payload = response.structured_content.expect("structured payload");
    let text = payload["text"].as_str().expect("text");
    assert!(text.starts_with("Error: Scanned PDF detected"), "{text}");
    document.assert_async().await;
    assert_eq!(generate.hits_async().await, 0);

    harness.shutdown().await;
}

#[tokio::test]
async fn explain_term_answers_empty_terms_locally() {
    let model_server = MockServer::start_async().await;
    let harness = TestHarness::new(&model_server).await;

    let response = harness.call(EXPLAIN_TOOL, json!({ "term": "   " })).await;
    let payload = response.structured_content.expect("structured payload");
    assert_eq!(payload["explanation"], EMPTY_TERM_MESSAGE);

    harness.shutdown().await;
}

#[tokio::test]
async fn settings_resource_describes_the_provider() {
    let model_server = MockServer::start_async().await;
    let harness = TestHarness::new(&model_server).await;

    let result = harness
        .service
        .read_resource(ReadResourceRequestParam {
            uri: "mcp://settings".into(),
        })
        .await
        .expect("read settings");
    let body = match &result.contents[0] {
        model::ResourceContents::TextResourceContents { text, .. } => text.clone(),
        other => panic!("unexpected contents {other:?}"),
    };
    let value: Value = serde_json::from_str(&body).expect("settings json");
    assert_eq!(value["pipeline"]["provider"], "local");
    assert_eq!(value["pipeline"]["model"], "llama3.2");

    harness.shutdown().await;
}

#[tokio::test]
async fn invalid_payload_returns_error() {
    let model_server = MockServer::start_async().await;
    let harness = TestHarness::new(&model_server).await;

    let err = harness
        .service
        .call_tool(CallToolRequestParam {
            name: SUMMARIZE_TOOL.into(),
            arguments: Some(json!({ "text": "" }).as_object().cloned().unwrap_or_default()),
        })
        .await
        .expect_err("summarize should fail");

    match err {
        rmcp::service::ServiceError::McpError(data) => {
            assert_eq!(data.code, model::ErrorCode::INVALID_PARAMS);
        }
        other => panic!("expected MCP error, got {other:?}"),
    }

    harness.shutdown().await;
}
