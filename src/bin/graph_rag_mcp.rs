//! MCP server entrypoint (stdio transport).
//!
//! Boots configuration and logging, connects the graph client and embedder, and serves the
//! `graph_retrieve` tool over stdio. Designed for editor/agent host integrations and shares all
//! runtime configuration with the `graphrag-retriever` CLI binary.

use anyhow::{Context, Result};
use graphrag_retriever::errors::CoreError;
use graphrag_retriever::graph::GraphBackend;
use graphrag_retriever::mcp::GraphRetrieverMcpServer;
use graphrag_retriever::{bootstrap, config, logging};
use rmcp::{service::ServiceExt, transport::stdio};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    config::init_config();
    logging::init_tracing();

    let stack = match bootstrap::init_stack().await {
        Ok(stack) => stack,
        Err(err) => {
            tracing::error!(code = err.code(), error = %err, "failed to bootstrap retrieval stack");
            return Err(err).context("failed to bootstrap retrieval stack");
        }
    };

    let graph_backend: Arc<dyn GraphBackend> = stack.graph.clone();
    let server = GraphRetrieverMcpServer::new(stack.retriever, graph_backend, stack.embedder);

    let service = server
        .serve(stdio())
        .await
        .context("failed to start MCP server over stdio")?;

    service
        .waiting()
        .await
        .context("MCP server terminated unexpectedly")?;

    stack.graph.close();

    Ok(())
}
