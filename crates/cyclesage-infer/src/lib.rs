//! CycleSage Infer — sentence embeddings and query cache.
//!
//! Provides the `EmbedderBackend` trait for generating embeddings.
//! `OllamaEmbedder` calls an external embedding model over HTTP; when it
//! cannot be built, `NoopEmbedder` is used and the chunker relies on its
//! lexical relatedness test alone.

pub mod cache;
pub mod embedder;
pub mod ollama;

pub use cache::{CachedEmbedder, QueryCache};
pub use embedder::{
    cosine_similarity, EmbedderBackend, EmbeddingResult, NoopEmbedder, HEALTH_CHECK_TEXT,
};
pub use ollama::OllamaEmbedder;

use std::sync::Arc;

use cyclesage_core::CycleSageConfig;

/// Create the embedder described by the configuration.
///
/// Wraps the HTTP embedder in a query cache; falls back to `NoopEmbedder`
/// if the HTTP client cannot be built.
pub fn create_embedder(config: &CycleSageConfig) -> Arc<dyn EmbedderBackend> {
    match OllamaEmbedder::new(config.embedding.base_url(), config.embedding_model.clone()) {
        Ok(embedder) => {
            tracing::info!(
                "Using embedding model {} at {}",
                config.embedding_model,
                config.embedding.base_url()
            );
            Arc::new(CachedEmbedder::new(
                Arc::new(embedder),
                QueryCache::default_cache(),
            ))
        }
        Err(e) => {
            tracing::warn!("Embedder unavailable: {}. Using lexical relatedness only.", e);
            Arc::new(NoopEmbedder::new(0))
        }
    }
}
