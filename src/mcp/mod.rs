//! Model Context Protocol (MCP) integration for Medlens.
//!
//! This module wires the medical pipeline into an MCP server so assistants and agent hosts can
//! summarize patient documents and explain terms over stdio. The surface area consists of:
//!
//! - Tools: `summarize-document`, `explain-term`, and `metrics`.
//! - Resources: `mcp://settings` (active provider and defaults) and `mcp://usage`.
//!
//! Handlers, schemas, and formatting helpers are kept in focused submodules to make tests and
//! reviews small and targeted.

mod format;
pub mod handlers;
mod registry;
mod schemas;
mod server;

pub use server::{EXPLAIN_TOOL, METRICS_TOOL, MedlensMcpServer, SUMMARIZE_TOOL};
