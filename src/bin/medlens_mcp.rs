//! MCP server entrypoint (stdio transport).
//!
//! Exposes document summarization and term explanation as MCP tools over stdio, for
//! editor and agent hosts. Shares all runtime configuration with the HTTP binary.
use anyhow::{Context, Result};
use medlens::{config, logging, mcp::MedlensMcpServer, processing::MedicalPipeline};
use rmcp::{service::ServiceExt, transport::stdio};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    config::init_config();
    logging::init_tracing_stderr();

    let pipeline = Arc::new(MedicalPipeline::new(config::get_config()));
    let server = MedlensMcpServer::new(pipeline);

    let service = server
        .serve(stdio())
        .await
        .context("failed to start MCP server over stdio")?;

    service
        .waiting()
        .await
        .context("MCP server terminated unexpectedly")?;

    Ok(())
}
