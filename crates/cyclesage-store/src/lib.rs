//! CycleSage Store — knowledge store adapter over a Chroma server.
//!
//! Chunks are written with flattened scalar metadata and queried by
//! embedding. Only the initial connection is fatal; write and query
//! failures are logged and surface as empty results.

pub mod chroma;
pub mod metadata;
pub mod types;

pub use chroma::{ChromaStore, CollectionHandle};
pub use metadata::clean_metadata;
pub use types::*;

/// Write and similarity-query operations the pipeline needs from a store.
pub trait KnowledgeStore: Send + Sync {
    /// Insert chunks that carry an embedding. Returns how many were written.
    fn add(&self, chunks: &[types::ContentChunk]) -> usize;

    /// Top `k` hits across all query texts, nearest first.
    fn query_many(&self, texts: &[&str], k: usize) -> Vec<types::QueryHit>;

    fn query(&self, text: &str, k: usize) -> Vec<types::QueryHit> {
        self.query_many(&[text], k)
    }

    /// Number of stored records, 0 if unknown.
    fn count(&self) -> usize;
}
