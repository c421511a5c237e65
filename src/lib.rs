#![deny(missing_docs)]

//! Core library for the GraphRAG retrieval agent.
//!
//! Wires together an [`embedding::Embedder`], a [`graph::GraphClient`], and a
//! [`retriever::Retriever`] orchestrator, then exposes the result both to a CLI binary and to an
//! MCP tool host via [`mcp::GraphRetrieverMcpServer`].

/// Process bootstrap: wires Config into an Embedder/GraphClient/Retriever stack.
pub mod bootstrap;
/// Environment-driven configuration management.
pub mod config;
/// Closed error taxonomy shared by every component.
pub mod errors;
/// Embedding client abstraction and the deterministic reference implementation.
pub mod embedding;
/// Property-graph access: connection lifecycle, vector search, and context expansion.
pub mod graph;
/// Structured logging and tracing setup.
pub mod logging;
/// Model Context Protocol server implementation.
pub mod mcp;
/// Retrieval pipeline orchestration: validation, search, expansion, and merge.
pub mod retriever;
