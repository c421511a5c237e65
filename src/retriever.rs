//! Retrieval pipeline orchestration: validation, search, expansion, and merge.

use crate::embedding::{EmbedError, Embedder};
use crate::errors::CoreError;
use crate::graph::{GraphBackend, GraphError};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while orchestrating a retrieval.
#[derive(Debug, Error)]
pub enum RetrieveError {
    /// The query was empty after trimming.
    #[error("Query is empty")]
    EmptyQuery,
    /// Encoding the query into a vector failed.
    #[error("Failed to embed query: {0}")]
    Embed(#[source] EmbedError),
    /// The vector search stage failed.
    #[error("Vector search failed: {0}")]
    VectorSearch(#[source] GraphError),
    /// Graph expansion could not complete; the core does not accept partial success.
    #[error("Graph expansion failed: {0}")]
    ExpansionFailed(#[source] GraphError),
}

impl CoreError for RetrieveError {
    fn code(&self) -> u32 {
        match self {
            Self::EmptyQuery => 5001,
            Self::Embed(err) => err.code(),
            Self::VectorSearch(err) => err.code(),
            // Expansion failures always recode to a fixed code, per the propagation policy's
            // one explicit exception: partial success is not an acceptable outcome.
            Self::ExpansionFailed(_) => 5002,
        }
    }
}

impl RetrieveError {
    /// Whether this failure represents a per-call timeout, for `kind=Timeout` detail reporting.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::EmptyQuery => false,
            Self::Embed(err) => err.is_timeout(),
            Self::VectorSearch(err) | Self::ExpansionFailed(err) => err.is_timeout(),
        }
    }
}

/// A single ranked retrieval result row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    /// Author of the article the matched chunk belongs to, or `"Unknown"`.
    pub author: String,
    /// Title of the article the matched chunk belongs to, or `"Unknown"`.
    pub article: String,
    /// Text of the matched chunk.
    pub chunk_text: String,
    /// Similarity score assigned by the vector index.
    pub score: f32,
}

/// Sentinel substituted for a missing author or article name.
pub const UNKNOWN: &str = "Unknown";

/// Ordered, ranked set of retrieval results for one query.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RetrieveResult {
    /// Ranked rows, preserving vector-search order (ties broken by chunk id ascending).
    pub rows: Vec<ResultRow>,
    /// Number of rows returned; always equal to `rows.len()`.
    pub total_results: usize,
}

/// Orchestrator composing an [`Embedder`] and a [`GraphBackend`] into the single `retrieve`
/// operation. Stateless beyond its two shared resources; safe to call from multiple tasks.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    graph: Arc<dyn GraphBackend>,
    default_limit: usize,
    max_limit: usize,
    timeout_per_call: Duration,
}

/// Narrow surface the tool adapter and CLI depend on, to ease testing with fakes.
#[async_trait]
pub trait Retrieve: Send + Sync {
    /// Run the full retrieval pipeline for one query.
    async fn retrieve(
        &self,
        query: &str,
        limit: Option<usize>,
    ) -> Result<RetrieveResult, RetrieveError>;
}

impl Retriever {
    /// Construct a retriever over a shared embedder and graph backend.
    ///
    /// `timeout_per_call` is applied independently to each of the embed, vector-search, and
    /// expand stages, per SPEC_FULL §5's cancellation model.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        graph: Arc<dyn GraphBackend>,
        default_limit: usize,
        max_limit: usize,
        timeout_per_call: Duration,
    ) -> Self {
        Self {
            embedder,
            graph,
            default_limit,
            max_limit,
            timeout_per_call,
        }
    }

    fn resolve_limit(&self, limit: Option<usize>) -> usize {
        let limit = limit.unwrap_or(self.default_limit);
        limit.clamp(1, self.max_limit)
    }
}

#[async_trait]
impl Retrieve for Retriever {
    async fn retrieve(
        &self,
        query: &str,
        limit: Option<usize>,
    ) -> Result<RetrieveResult, RetrieveError> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Err(RetrieveError::EmptyQuery);
        }
        let k = self.resolve_limit(limit);

        let vector = match tokio::time::timeout(self.timeout_per_call, self.embedder.embed(trimmed))
            .await
        {
            Ok(result) => result.map_err(RetrieveError::Embed)?,
            Err(_elapsed) => return Err(RetrieveError::Embed(EmbedError::Timeout)),
        };

        let mut hits = match tokio::time::timeout(
            self.timeout_per_call,
            self.graph.vector_search(&vector, k),
        )
        .await
        {
            Ok(result) => result.map_err(RetrieveError::VectorSearch)?,
            Err(_elapsed) => return Err(RetrieveError::VectorSearch(GraphError::Timeout)),
        };

        dedupe_hits_by_chunk_id(&mut hits);

        if hits.is_empty() {
            return Ok(RetrieveResult {
                rows: Vec::new(),
                total_results: 0,
            });
        }

        let chunk_ids: Vec<String> = hits.iter().map(|hit| hit.chunk_id.clone()).collect();
        let contexts = match tokio::time::timeout(
            self.timeout_per_call,
            self.graph.expand(&chunk_ids),
        )
        .await
        {
            Ok(result) => result.map_err(RetrieveError::ExpansionFailed)?,
            Err(_elapsed) => return Err(RetrieveError::ExpansionFailed(GraphError::Timeout)),
        };

        let context_by_chunk: HashMap<&str, &crate::graph::Context> = contexts
            .iter()
            .map(|ctx| (ctx.chunk_id.as_str(), ctx))
            .collect();

        let rows = hits
            .into_iter()
            .map(|hit| {
                let ctx = context_by_chunk.get(hit.chunk_id.as_str());
                let author = ctx
                    .and_then(|c| c.author_name.clone())
                    .unwrap_or_else(|| UNKNOWN.to_string());
                let article = ctx
                    .and_then(|c| c.article_title.clone())
                    .unwrap_or_else(|| UNKNOWN.to_string());
                ResultRow {
                    author,
                    article,
                    chunk_text: hit.chunk_text,
                    score: hit.score,
                }
            })
            .collect::<Vec<_>>();

        let total_results = rows.len();
        Ok(RetrieveResult { rows, total_results })
    }
}

/// Collapse duplicate chunk ids to their first occurrence, then restore score-desc /
/// chunk-id-asc ordering for any ties the vector index left unbroken.
fn dedupe_hits_by_chunk_id(hits: &mut Vec<crate::graph::Hit>) {
    let mut seen = std::collections::HashSet::new();
    hits.retain(|hit| seen.insert(hit.chunk_id.clone()));
    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.chunk_id.cmp(&b.chunk_id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::ModelInfo;
    use crate::graph::{Context, Hit};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeEmbedder;

    #[async_trait]
    impl Embedder for FakeEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
            if text.trim().is_empty() {
                return Err(EmbedError::Encode("empty".into()));
            }
            Ok(vec![0.1, 0.2, 0.3])
        }

        fn info(&self) -> ModelInfo {
            ModelInfo {
                model_id: "fake".into(),
                dimension: 3,
            }
        }
    }

    struct FakeGraph {
        hits: Vec<Hit>,
        contexts: Vec<Context>,
        expand_fails: bool,
        expand_calls: Mutex<usize>,
    }

    #[async_trait]
    impl GraphBackend for FakeGraph {
        async fn vector_search(&self, _vector: &[f32], k: usize) -> Result<Vec<Hit>, GraphError> {
            Ok(self.hits.iter().take(k).cloned().collect())
        }

        async fn expand(&self, _chunk_ids: &[String]) -> Result<Vec<Context>, GraphError> {
            *self.expand_calls.lock().unwrap() += 1;
            if self.expand_fails {
                return Err(GraphError::Query("boom".into()));
            }
            Ok(self.contexts.clone())
        }

        async fn ping(&self) -> Result<bool, GraphError> {
            Ok(true)
        }
    }

    struct SlowEmbedder;

    #[async_trait]
    impl Embedder for SlowEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbedError> {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(vec![0.1, 0.2, 0.3])
        }

        fn info(&self) -> ModelInfo {
            ModelInfo {
                model_id: "slow".into(),
                dimension: 3,
            }
        }
    }

    struct SlowVectorSearchGraph;

    #[async_trait]
    impl GraphBackend for SlowVectorSearchGraph {
        async fn vector_search(&self, _vector: &[f32], _k: usize) -> Result<Vec<Hit>, GraphError> {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(vec![])
        }

        async fn expand(&self, _chunk_ids: &[String]) -> Result<Vec<Context>, GraphError> {
            Ok(vec![])
        }

        async fn ping(&self) -> Result<bool, GraphError> {
            Ok(true)
        }
    }

    fn retriever(graph: FakeGraph) -> Retriever {
        Retriever::new(
            Arc::new(FakeEmbedder),
            Arc::new(graph),
            5,
            50,
            Duration::from_millis(5_000),
        )
    }

    #[tokio::test]
    async fn s1_single_match_happy_path() {
        let graph = FakeGraph {
            hits: vec![Hit {
                chunk_id: "c1".into(),
                chunk_text: "GPT-4 generalizes across tasks.".into(),
                score: 0.9,
            }],
            contexts: vec![Context {
                chunk_id: "c1".into(),
                article_title: Some("Transformers".into()),
                author_name: Some("Alice".into()),
            }],
            expand_fails: false,
            expand_calls: Mutex::new(0),
        };

        let result = retriever(graph)
            .retrieve("Who wrote about GPT-4?", None)
            .await
            .unwrap();

        assert_eq!(result.total_results, 1);
        assert_eq!(result.rows[0].author, "Alice");
        assert_eq!(result.rows[0].article, "Transformers");
    }

    #[tokio::test]
    async fn s2_preserves_vector_search_order() {
        let graph = FakeGraph {
            hits: vec![
                Hit {
                    chunk_id: "7".into(),
                    chunk_text: "a".into(),
                    score: 0.91,
                },
                Hit {
                    chunk_id: "3".into(),
                    chunk_text: "b".into(),
                    score: 0.87,
                },
                Hit {
                    chunk_id: "12".into(),
                    chunk_text: "c".into(),
                    score: 0.85,
                },
            ],
            contexts: vec![],
            expand_fails: false,
            expand_calls: Mutex::new(0),
        };

        let result = retriever(graph).retrieve("query", Some(5)).await.unwrap();

        assert_eq!(result.total_results, 3);
        let ids: Vec<&str> = result
            .rows
            .iter()
            .map(|row| row.chunk_text.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn s3_ties_break_by_chunk_id_ascending() {
        let graph = FakeGraph {
            hits: vec![
                Hit {
                    chunk_id: "9".into(),
                    chunk_text: "nine".into(),
                    score: 0.80,
                },
                Hit {
                    chunk_id: "4".into(),
                    chunk_text: "four".into(),
                    score: 0.80,
                },
            ],
            contexts: vec![],
            expand_fails: false,
            expand_calls: Mutex::new(0),
        };

        let result = retriever(graph).retrieve("query", None).await.unwrap();

        let texts: Vec<&str> = result.rows.iter().map(|r| r.chunk_text.as_str()).collect();
        assert_eq!(texts, vec!["four", "nine"]);
    }

    #[tokio::test]
    async fn s4_missing_author_substitutes_unknown() {
        let graph = FakeGraph {
            hits: vec![Hit {
                chunk_id: "c1".into(),
                chunk_text: "some text".into(),
                score: 0.5,
            }],
            contexts: vec![Context {
                chunk_id: "c1".into(),
                article_title: Some("Some Article".into()),
                author_name: None,
            }],
            expand_fails: false,
            expand_calls: Mutex::new(0),
        };

        let result = retriever(graph).retrieve("query", None).await.unwrap();

        assert_eq!(result.rows[0].author, "Unknown");
        assert_eq!(result.rows[0].article, "Some Article");
    }

    #[tokio::test]
    async fn s5_empty_query_fails_with_5001() {
        let graph = FakeGraph {
            hits: vec![],
            contexts: vec![],
            expand_fails: false,
            expand_calls: Mutex::new(0),
        };

        let err = retriever(graph).retrieve("   ", None).await.unwrap_err();
        assert_eq!(err.code(), 5001);
    }

    #[tokio::test]
    async fn empty_vector_search_result_skips_expand() {
        let graph = FakeGraph {
            hits: vec![],
            contexts: vec![],
            expand_fails: false,
            expand_calls: Mutex::new(0),
        };

        let result = retriever(graph).retrieve("query", None).await.unwrap();

        assert_eq!(result.total_results, 0);
        assert!(result.rows.is_empty());
    }

    #[tokio::test]
    async fn expansion_failure_recodes_to_5002() {
        let graph = FakeGraph {
            hits: vec![Hit {
                chunk_id: "c1".into(),
                chunk_text: "x".into(),
                score: 0.5,
            }],
            contexts: vec![],
            expand_fails: true,
            expand_calls: Mutex::new(0),
        };

        let err = retriever(graph).retrieve("query", None).await.unwrap_err();
        assert_eq!(err.code(), 5002);
    }

    #[tokio::test]
    async fn limit_is_clamped_to_max() {
        let graph = FakeGraph {
            hits: (0..10)
                .map(|i| Hit {
                    chunk_id: i.to_string(),
                    chunk_text: i.to_string(),
                    score: 1.0,
                })
                .collect(),
            contexts: vec![],
            expand_fails: false,
            expand_calls: Mutex::new(0),
        };

        let result = Retriever::new(
            Arc::new(FakeEmbedder),
            Arc::new(graph),
            5,
            3,
            Duration::from_millis(5_000),
        )
        .retrieve("query", Some(100))
        .await
        .unwrap();

        assert_eq!(result.total_results, 3);
    }

    #[tokio::test]
    async fn embed_phase_timeout_surfaces_as_3002() {
        let retriever = Retriever::new(
            Arc::new(SlowEmbedder),
            Arc::new(FakeGraph {
                hits: vec![],
                contexts: vec![],
                expand_fails: false,
                expand_calls: Mutex::new(0),
            }),
            5,
            50,
            Duration::from_millis(10),
        );

        let err = retriever.retrieve("query", None).await.unwrap_err();
        assert_eq!(err.code(), 3002);
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn vector_search_timeout_surfaces_as_2004() {
        let retriever = Retriever::new(
            Arc::new(FakeEmbedder),
            Arc::new(SlowVectorSearchGraph),
            5,
            50,
            Duration::from_millis(10),
        );

        let err = retriever.retrieve("query", None).await.unwrap_err();
        assert_eq!(err.code(), 2004);
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn duplicate_chunk_ids_collapse_to_first_occurrence() {
        let graph = FakeGraph {
            hits: vec![
                Hit {
                    chunk_id: "1".into(),
                    chunk_text: "first".into(),
                    score: 0.9,
                },
                Hit {
                    chunk_id: "1".into(),
                    chunk_text: "duplicate".into(),
                    score: 0.9,
                },
            ],
            contexts: vec![],
            expand_fails: false,
            expand_calls: Mutex::new(0),
        };

        let result = retriever(graph).retrieve("query", None).await.unwrap();

        assert_eq!(result.total_results, 1);
    }
}
