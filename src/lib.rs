#![deny(missing_docs)]

//! Core library for Medlens: patient-friendly summaries of medical documents.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Document fetching, PDF text-layer parsing and OCR.
pub mod extraction;
/// Language model provider abstraction and backends.
pub mod llm;
/// Structured logging and tracing setup.
pub mod logging;
/// Model Context Protocol server implementation.
pub mod mcp;
/// Pipeline counters.
pub mod metrics;
/// Cleaning, chunking, prompting and summarization orchestration.
pub mod processing;
