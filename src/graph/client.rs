//! Driver wrapper for interacting with the property graph over Bolt.

use crate::graph::types::{Context, GraphError, Hit};
use async_trait::async_trait;
use neo4rs::{ConfigBuilder, Graph, Row, query};
use std::sync::atomic::{AtomicU8, Ordering};

const STATE_UNCONNECTED: u8 = 0;
const STATE_CONNECTED: u8 = 1;
const STATE_CLOSED: u8 = 2;

/// Narrow graph-access surface the Retriever depends on.
///
/// Separated from [`GraphClient`] so tests can supply a fake backend without a live Bolt server.
#[async_trait]
pub trait GraphBackend: Send + Sync {
    /// Approximate-nearest-neighbor search over the configured vector index.
    async fn vector_search(&self, vector: &[f32], k: usize) -> Result<Vec<Hit>, GraphError>;

    /// Expand a batch of chunk identities to their article/author context in one round-trip.
    async fn expand(&self, chunk_ids: &[String]) -> Result<Vec<Context>, GraphError>;

    /// Lightweight reachability check, and whether the configured vector index exists.
    ///
    /// Used by the `status` CLI subcommand and the `mcp://health` resource; never runs a full
    /// retrieval.
    async fn ping(&self) -> Result<bool, GraphError>;
}

/// Pooled connection to the property graph, built from a Bolt endpoint and a named vector index.
pub struct GraphClient {
    graph: Graph,
    index_name: String,
    state: AtomicU8,
}

impl GraphClient {
    /// Open a pooled connection and verify connectivity with a trivial `RETURN 1` round-trip.
    ///
    /// Valid only from the unconnected state; state machine: `Unconnected -> Connected -> Closed`.
    pub async fn connect(
        endpoint: &str,
        username: &str,
        password: &str,
        database: &str,
        index_name: impl Into<String>,
    ) -> Result<Self, GraphError> {
        let config = ConfigBuilder::default()
            .uri(endpoint)
            .user(username)
            .password(password)
            .db(database)
            .build()
            .map_err(|err| GraphError::Connect(err.to_string()))?;

        let graph = Graph::connect(config)
            .await
            .map_err(|err| classify_connect_error(&err))?;

        graph
            .execute(query("RETURN 1"))
            .await
            .map_err(|err| classify_connect_error(&err))?
            .next()
            .await
            .map_err(|err| classify_connect_error(&err))?;

        let index_name = index_name.into();
        tracing::debug!(endpoint, database, index = %index_name, "Connected to graph database");

        Ok(Self {
            graph,
            index_name,
            state: AtomicU8::new(STATE_CONNECTED),
        })
    }

    fn require_connected(&self) -> Result<(), GraphError> {
        if self.state.load(Ordering::Acquire) != STATE_CONNECTED {
            return Err(GraphError::Query(
                "graph client is not connected".to_string(),
            ));
        }
        Ok(())
    }

    /// Idempotent release of the pool and driver. Valid from any non-closed state.
    pub fn close(&self) {
        self.state.store(STATE_CLOSED, Ordering::Release);
    }
}

#[async_trait]
impl GraphBackend for GraphClient {
    async fn vector_search(&self, vector: &[f32], k: usize) -> Result<Vec<Hit>, GraphError> {
        self.require_connected()?;

        let mut stream = self
            .graph
            .execute(
                query(
                    "CALL db.index.vector.queryNodes($index, $k, $vector) \
                     YIELD node, score \
                     RETURN elementId(node) AS chunk_id, node.text AS chunk_text, score",
                )
                .param("index", self.index_name.clone())
                .param("k", k as i64)
                .param("vector", vector.to_vec()),
            )
            .await
            .map_err(|err| classify_query_error(&err, &self.index_name))?;

        let mut hits = Vec::new();
        while let Some(row) = stream
            .next()
            .await
            .map_err(|err| classify_query_error(&err, &self.index_name))?
        {
            hits.push(row_to_hit(&row)?);
        }
        Ok(hits)
    }

    async fn expand(&self, chunk_ids: &[String]) -> Result<Vec<Context>, GraphError> {
        self.require_connected()?;

        if chunk_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut stream = self
            .graph
            .execute(
                query(
                    "UNWIND $ids AS id \
                     OPTIONAL MATCH (chunk) WHERE elementId(chunk) = id \
                     OPTIONAL MATCH (article:Article)-[:HAS_CHUNK]->(chunk) \
                     WITH id, head(collect(article)) AS article \
                     OPTIONAL MATCH (author:Author)-[:WROTE]->(article) \
                     WITH id, article, head(collect(author)) AS author \
                     RETURN id AS chunk_id, article.title AS article_title, author.name AS author_name",
                )
                .param("ids", chunk_ids.to_vec()),
            )
            .await
            .map_err(|err| GraphError::Query(err.to_string()))?;

        let mut contexts = Vec::new();
        while let Some(row) = stream
            .next()
            .await
            .map_err(|err| GraphError::Query(err.to_string()))?
        {
            contexts.push(row_to_context(&row)?);
        }
        Ok(contexts)
    }

    async fn ping(&self) -> Result<bool, GraphError> {
        self.require_connected()?;

        self.graph
            .execute(query("RETURN 1"))
            .await
            .map_err(|err| GraphError::Query(err.to_string()))?
            .next()
            .await
            .map_err(|err| GraphError::Query(err.to_string()))?;

        let mut stream = self
            .graph
            .execute(query("SHOW INDEXES YIELD name WHERE name = $index").param("index", self.index_name.clone()))
            .await
            .map_err(|err| GraphError::Query(err.to_string()))?;

        let index_present = stream
            .next()
            .await
            .map_err(|err| GraphError::Query(err.to_string()))?
            .is_some();

        Ok(index_present)
    }
}

fn row_to_hit(row: &Row) -> Result<Hit, GraphError> {
    let chunk_id: String = row
        .get("chunk_id")
        .map_err(|err| GraphError::ResultShape(err.to_string()))?;
    let chunk_text: String = row
        .get("chunk_text")
        .map_err(|err| GraphError::ResultShape(err.to_string()))?;
    let score: f32 = row
        .get("score")
        .map_err(|err| GraphError::ResultShape(err.to_string()))?;
    Ok(Hit {
        chunk_id,
        chunk_text,
        score,
    })
}

fn row_to_context(row: &Row) -> Result<Context, GraphError> {
    let chunk_id: String = row
        .get("chunk_id")
        .map_err(|err| GraphError::ResultShape(err.to_string()))?;
    let article_title: Option<String> = row.get("article_title").ok();
    let author_name: Option<String> = row.get("author_name").ok();
    Ok(Context {
        chunk_id,
        article_title,
        author_name,
    })
}

fn classify_connect_error(err: &neo4rs::Error) -> GraphError {
    let message = err.to_string();
    let lower = message.to_lowercase();
    if lower.contains("auth") || lower.contains("unauthorized") || lower.contains("credential") {
        GraphError::Auth(message)
    } else {
        GraphError::Connect(message)
    }
}

fn classify_query_error(err: &neo4rs::Error, index_name: &str) -> GraphError {
    let message = err.to_string();
    let lower = message.to_lowercase();
    if lower.contains("no such index")
        || (lower.contains(&index_name.to_lowercase()) && lower.contains("index"))
    {
        GraphError::IndexMissing(message)
    } else {
        GraphError::Query(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CoreError;

    #[test]
    fn connect_error_without_auth_hint_classifies_as_connect() {
        let err = GraphError::Connect("connection refused".to_string());
        assert_eq!(err.code(), 2001);
    }

    #[test]
    fn index_missing_has_code_2003() {
        let err = GraphError::IndexMissing("no such index: chunk_embeddings".to_string());
        assert_eq!(err.code(), 2003);
    }
}
