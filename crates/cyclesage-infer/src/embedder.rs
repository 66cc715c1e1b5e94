//! Embedding engine trait and implementations.
//!
//! The `EmbedderBackend` trait abstracts over embedding generation.
//! Implementations:
//! - `OllamaEmbedder`: external sentence-embedding model over HTTP
//! - `CachedEmbedder`: wraps any backend with a query cache
//! - `NoopEmbedder`: returns None, callers use their lexical fallback

use cyclesage_core::{Error, Result};
use ndarray::Array1;

/// Short text embedded by [`EmbedderBackend::health_check`].
pub const HEALTH_CHECK_TEXT: &str = "ciclo menstrual";

/// Result of an embedding operation.
#[derive(Debug, Clone)]
pub struct EmbeddingResult {
    /// Float32 embedding vector.
    pub embedding: Array1<f32>,
    /// Whether this was served from cache.
    pub cached: bool,
}

/// Trait for embedding backends.
pub trait EmbedderBackend: Send + Sync {
    /// Generate an embedding for a text string.
    /// Returns None if the embedder is not available or the call failed.
    fn embed(&self, text: &str) -> Option<EmbeddingResult>;

    /// Generate embeddings for a batch of texts.
    fn embed_batch(&self, texts: &[&str]) -> Vec<Option<EmbeddingResult>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Embedding dimension, 0 while unknown.
    fn dimension(&self) -> usize;

    /// Check if the embedder can produce vectors at all.
    fn is_available(&self) -> bool;

    /// Embed one short text and report why it failed, if it did.
    fn health_check(&self) -> Result<()> {
        match self.embed(HEALTH_CHECK_TEXT) {
            Some(_) => Ok(()),
            None => Err(Error::Embedding("embedder produced no vector".into())),
        }
    }
}

/// Placeholder embedder that always returns None.
pub struct NoopEmbedder {
    dim: usize,
}

impl NoopEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl EmbedderBackend for NoopEmbedder {
    fn embed(&self, _text: &str) -> Option<EmbeddingResult> {
        None
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn is_available(&self) -> bool {
        false
    }
}

/// Cosine similarity of two vectors. Zero-length or mismatched vectors
/// score 0.0.
pub fn cosine_similarity(a: &Array1<f32>, b: &Array1<f32>) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let norm_a = a.dot(a).sqrt();
    let norm_b = b.dot(b).sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    a.dot(b) / (norm_a * norm_b)
}
