//! Process bootstrap shared by the CLI and the MCP binary.
//!
//! Connects the graph client and constructs the embedder exactly once per process, then composes
//! them into a [`Retriever`](crate::retriever::Retriever) behind trait objects so both entry
//! points build the same stack from the same configuration.

use crate::config::get_config;
use crate::embedding::{DeterministicEmbedder, EmbedError, Embedder};
use crate::errors::CoreError;
use crate::graph::{GraphBackend, GraphClient, GraphError};
use crate::retriever::{Retrieve, Retriever};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while connecting the graph client or constructing the embedder at startup.
///
/// Kept distinct from [`anyhow::Error`] so the originating [`CoreError::code`] survives all the
/// way to the CLI's and MCP server's own failure reporting (e.g. a wrong password must still
/// surface as 2002, not a generic bootstrap code).
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// The graph database could not be reached, or rejected credentials, or lacks the configured
    /// vector index.
    #[error("Failed to connect to graph database: {0}")]
    Graph(#[source] GraphError),
    /// The embedder could not be constructed from the configured model id and dimension.
    #[error("Failed to initialize embedder: {0}")]
    Embed(#[source] EmbedError),
}

impl CoreError for BootstrapError {
    fn code(&self) -> u32 {
        match self {
            Self::Graph(err) => err.code(),
            Self::Embed(err) => err.code(),
        }
    }
}

/// The shared components a process needs to serve retrievals.
pub struct AppStack {
    /// The composed retrieval orchestrator.
    pub retriever: Arc<dyn Retrieve>,
    /// The graph backend, kept around for health checks and orderly shutdown.
    pub graph: Arc<GraphClient>,
    /// The embedder, kept around for `info()` accessors (e.g. the `status` CLI output).
    pub embedder: Arc<dyn Embedder>,
}

/// Connect to the graph, construct the embedder, and compose the retriever stack.
pub async fn init_stack() -> Result<AppStack, BootstrapError> {
    let config = get_config();

    let graph = GraphClient::connect(
        &config.graph_endpoint,
        &config.graph_username,
        &config.graph_password,
        &config.graph_database,
        config.vector_index_name.clone(),
    )
    .await
    .map_err(BootstrapError::Graph)?;
    let graph = Arc::new(graph);

    let embedder: Arc<dyn Embedder> = Arc::new(
        DeterministicEmbedder::new(config.embedding_model_id.clone(), config.vector_dimension)
            .map_err(BootstrapError::Embed)?,
    );

    let graph_backend: Arc<dyn GraphBackend> = graph.clone();
    let retriever: Arc<dyn Retrieve> = Arc::new(Retriever::new(
        embedder.clone(),
        graph_backend,
        config.retrieval_default_limit,
        config.retrieval_max_limit,
        Duration::from_millis(config.timeout_per_call_millis),
    ));

    Ok(AppStack {
        retriever,
        graph,
        embedder,
    })
}
