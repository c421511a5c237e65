//! Embedding client abstraction and the deterministic reference implementation.
//!
//! An [`Embedder`] is initialized exactly once per process and reused for every query. It caches
//! no embeddings: each call to [`Embedder::embed`] recomputes the vector from the raw input text.

use crate::errors::CoreError;
use async_trait::async_trait;
use thiserror::Error;

/// Errors raised while loading or running an embedding model.
#[derive(Debug, Error)]
pub enum EmbedError {
    /// The model could not be loaded at initialization.
    #[error("Failed to load embedding model: {0}")]
    ModelLoad(String),
    /// Encoding a query failed or timed out.
    #[error("Failed to encode text: {0}")]
    Encode(String),
    /// The model's declared output dimension does not match the configured expectation.
    #[error("Embedding dimension mismatch: model produces {actual}, expected {expected}")]
    DimensionMismatch {
        /// Dimension actually produced by the model.
        actual: usize,
        /// Dimension declared by configuration.
        expected: usize,
    },
    /// Encoding did not finish within the configured per-call timeout.
    #[error("Encoding timed out")]
    Timeout,
}

impl CoreError for EmbedError {
    fn code(&self) -> u32 {
        match self {
            Self::ModelLoad(_) => 3001,
            Self::Encode(_) => 3002,
            Self::DimensionMismatch { .. } => 3003,
            Self::Timeout => 3002,
        }
    }
}

impl EmbedError {
    /// Whether this failure represents a per-call timeout, for `kind=Timeout` detail reporting.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

/// Identity of the loaded embedding model.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    /// Model identifier, as configured via `EMBEDDING_MODEL_ID`.
    pub model_id: String,
    /// Declared output dimension.
    pub dimension: usize,
}

/// Interface implemented by embedding backends.
///
/// The model is process-wide and must be safe for concurrent `embed` calls; the reference
/// implementation below has no shared mutable state, so this is trivially satisfied.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Encode a single piece of text into a dense vector of length `info().dimension`.
    ///
    /// `text` must be non-empty after trimming; callers (the Retriever) are responsible for that
    /// validation before calling in.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError>;

    /// Pure accessor for the loaded model's identity; never fails after successful init.
    fn info(&self) -> ModelInfo;
}

/// Deterministic, content-hashing embedding backend.
///
/// Suitable for tests and offline operation. It performs no normalization beyond scaling each
/// byte into its vector slot and L2-normalizing the result; swapping in a real sentence-embedding
/// backend (e.g. an Ollama-served model) only requires a new `Embedder` implementation behind the
/// same trait seam.
pub struct DeterministicEmbedder {
    model_id: String,
    dimension: usize,
}

impl DeterministicEmbedder {
    /// Construct a new deterministic embedder, verifying the declared dimension is non-zero.
    pub fn new(model_id: impl Into<String>, dimension: usize) -> Result<Self, EmbedError> {
        if dimension == 0 {
            return Err(EmbedError::ModelLoad(
                "embedding dimension must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            model_id: model_id.into(),
            dimension,
        })
    }

    fn encode(text: &str, dimension: usize) -> Vec<f32> {
        let mut embedding = vec![0.0_f32; dimension];

        for (idx, byte) in text.bytes().enumerate() {
            let position = idx % dimension;
            embedding[position] += f32::from(byte) / 255.0;
        }

        let norm = embedding
            .iter()
            .map(|value| value * value)
            .sum::<f32>()
            .sqrt();

        if norm > 0.0 {
            for value in &mut embedding {
                *value /= norm;
            }
        }

        embedding
    }
}

#[async_trait]
impl Embedder for DeterministicEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(EmbedError::Encode("input text is empty".to_string()));
        }

        tracing::debug!(
            model = %self.model_id,
            dimension = self.dimension,
            "Encoding query"
        );

        let vector = Self::encode(trimmed, self.dimension);
        if vector.len() != self.dimension {
            return Err(EmbedError::DimensionMismatch {
                actual: vector.len(),
                expected: self.dimension,
            });
        }
        Ok(vector)
    }

    fn info(&self) -> ModelInfo {
        ModelInfo {
            model_id: self.model_id.clone(),
            dimension: self.dimension,
        }
    }
}
