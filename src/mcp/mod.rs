//! Model Context Protocol (MCP) integration for the GraphRAG retrieval agent.
//!
//! This module wires the Retriever into an MCP server so conversational hosts can call the
//! single `graph_retrieve` tool over stdio. The surface area consists of:
//!
//! - Tools: `graph_retrieve`.
//! - Resources: `mcp://health`, `mcp://settings`.
//!
//! Handlers, schemas, and formatting helpers are kept in focused submodules to make tests and
//! reviews small and targeted.

mod format;
pub mod handlers;
mod registry;
mod schemas;
mod server;

pub use server::GraphRetrieverMcpServer;

use crate::errors::CoreError;
use thiserror::Error;

/// Errors raised by the tool-adapter surface itself, distinct from retrieval failures.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The tool host refused registration (e.g. a name conflict).
    #[error("Failed to register tool: {0}")]
    Register(String),
    /// The host supplied invalid or unrecognized parameters.
    #[error("Invalid tool parameters: {0}")]
    Params(String),
    /// An invocation arrived while the server was draining in-flight work.
    #[error("Server is shutting down")]
    ServerShutdown,
}

impl CoreError for ToolError {
    fn code(&self) -> u32 {
        match self {
            Self::Register(_) => 4001,
            Self::Params(_) => 4002,
            Self::ServerShutdown => 4003,
        }
    }
}
