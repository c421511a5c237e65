//! Shared types used by the graph client.

use crate::errors::CoreError;
use thiserror::Error;

/// Errors returned while interacting with the property graph.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Connection could not be opened, or timed out, before any query ran.
    #[error("Failed to connect to graph database: {0}")]
    Connect(String),
    /// Credentials were rejected by the graph database.
    #[error("Graph authentication failed: {0}")]
    Auth(String),
    /// The configured vector index does not exist.
    #[error("Vector index not found: {0}")]
    IndexMissing(String),
    /// A query failed during execution or transport, or exceeded its timeout.
    #[error("Graph query failed: {0}")]
    Query(String),
    /// The driver returned a row shape the client did not expect.
    #[error("Unexpected graph result shape: {0}")]
    ResultShape(String),
    /// A query did not finish within the configured per-call timeout.
    #[error("Graph query timed out")]
    Timeout,
}

impl CoreError for GraphError {
    fn code(&self) -> u32 {
        match self {
            Self::Connect(_) => 2001,
            Self::Auth(_) => 2002,
            Self::IndexMissing(_) => 2003,
            Self::Query(_) => 2004,
            Self::ResultShape(_) => 2005,
            Self::Timeout => 2004,
        }
    }
}

impl GraphError {
    /// Whether this failure represents a per-call timeout, for `kind=Timeout` detail reporting.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

/// A single match returned by a vector-index query.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    /// Graph-native identity of the matched chunk node (the driver's stable `elementId`).
    pub chunk_id: String,
    /// Text carried by the matched chunk.
    pub chunk_text: String,
    /// Similarity score assigned by the vector index; higher is better.
    pub score: f32,
}

/// Article/author annotation obtained by expanding back from a chunk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    /// Identity of the chunk this context was expanded from.
    pub chunk_id: String,
    /// Title of the article containing the chunk, if the edge was present.
    pub article_title: Option<String>,
    /// Name of the author who wrote the article, if the edge was present.
    pub author_name: Option<String>,
}
