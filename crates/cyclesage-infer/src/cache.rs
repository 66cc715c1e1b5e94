//! LRU cache for embedding results.
//!
//! A short section becomes a chunk with exactly the text of its paragraph,
//! so chunk embedding repeats work done during section grouping; retrieval
//! repeats the same search terms across content types. Default: 1000
//! entries, 1-hour TTL.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ndarray::Array1;
use parking_lot::Mutex;

use crate::embedder::{EmbedderBackend, EmbeddingResult};

/// Cached embedding entry with timestamp.
struct CacheEntry {
    embedding: Array1<f32>,
    inserted_at: Instant,
}

/// Thread-safe LRU cache keyed by input text.
pub struct QueryCache {
    inner: Mutex<CacheInner>,
}

struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    order: Vec<String>,
    max_size: usize,
    ttl: Duration,
}

impl CacheInner {
    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            let key = self.order.remove(pos);
            self.order.push(key);
        }
    }

    fn evict(&mut self, key: &str) {
        self.entries.remove(key);
        self.order.retain(|k| k != key);
    }
}

impl QueryCache {
    /// Create a new cache with the given capacity and TTL.
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::with_capacity(max_size),
                order: Vec::with_capacity(max_size),
                max_size,
                ttl,
            }),
        }
    }

    /// Create a cache with default settings (1000 entries, 1hr TTL).
    pub fn default_cache() -> Self {
        Self::new(1000, Duration::from_secs(3600))
    }

    /// Get a cached embedding. Returns None on miss or expired entry.
    pub fn get(&self, text: &str) -> Option<Array1<f32>> {
        let mut inner = self.inner.lock();
        let ttl = inner.ttl;

        let (embedding, expired) = match inner.entries.get(text) {
            Some(entry) => (entry.embedding.clone(), entry.inserted_at.elapsed() >= ttl),
            None => return None,
        };

        if expired {
            inner.evict(text);
            None
        } else {
            inner.touch(text);
            Some(embedding)
        }
    }

    /// Insert an embedding into the cache.
    pub fn put(&self, text: String, embedding: Array1<f32>) {
        let mut inner = self.inner.lock();
        let entry = CacheEntry {
            embedding,
            inserted_at: Instant::now(),
        };

        if inner.entries.contains_key(&text) {
            inner.entries.insert(text.clone(), entry);
            inner.touch(&text);
            return;
        }

        // Evict oldest if at capacity
        while inner.entries.len() >= inner.max_size && !inner.order.is_empty() {
            let oldest = inner.order.remove(0);
            inner.entries.remove(&oldest);
        }

        inner.order.push(text.clone());
        inner.entries.insert(text, entry);
    }

    /// Number of entries in the cache.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all entries.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.order.clear();
    }
}

/// An embedder that consults a [`QueryCache`] before its inner backend.
pub struct CachedEmbedder {
    inner: Arc<dyn EmbedderBackend>,
    cache: QueryCache,
}

impl CachedEmbedder {
    pub fn new(inner: Arc<dyn EmbedderBackend>, cache: QueryCache) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }
}

impl EmbedderBackend for CachedEmbedder {
    fn embed(&self, text: &str) -> Option<EmbeddingResult> {
        if let Some(embedding) = self.cache.get(text) {
            return Some(EmbeddingResult {
                embedding,
                cached: true,
            });
        }
        let result = self.inner.embed(text)?;
        self.cache.put(text.to_string(), result.embedding.clone());
        Some(result)
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn is_available(&self) -> bool {
        self.inner.is_available()
    }

    fn health_check(&self) -> cyclesage_core::Result<()> {
        self.inner.health_check()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_cache_hit_and_miss() {
        let cache = QueryCache::new(10, Duration::from_secs(3600));
        assert!(cache.get("ciclo").is_none());

        cache.put("ciclo".into(), array![1.0, 2.0, 3.0]);
        assert_eq!(cache.get("ciclo"), Some(array![1.0, 2.0, 3.0]));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_eviction() {
        let cache = QueryCache::new(2, Duration::from_secs(3600));
        cache.put("a".into(), array![1.0]);
        cache.put("b".into(), array![2.0]);
        // Touch "a" so "b" becomes the oldest
        assert!(cache.get("a").is_some());

        cache.put("c".into(), array![3.0]);
        assert_eq!(cache.len(), 2);
        assert!(cache.get("b").is_none());
        assert!(cache.get("a").is_some());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn test_cache_ttl_expiry() {
        let cache = QueryCache::new(10, Duration::from_millis(1));
        cache.put("efímero".into(), array![1.0]);

        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get("efímero").is_none());
        assert!(cache.is_empty());
    }

    struct CountingEmbedder {
        calls: AtomicUsize,
    }

    impl EmbedderBackend for CountingEmbedder {
        fn embed(&self, text: &str) -> Option<EmbeddingResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Some(EmbeddingResult {
                embedding: array![text.len() as f32, 1.0],
                cached: false,
            })
        }

        fn dimension(&self) -> usize {
            2
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_cached_embedder_reuses_vectors() {
        let backend = Arc::new(CountingEmbedder {
            calls: AtomicUsize::new(0),
        });
        let embedder = CachedEmbedder::new(backend.clone(), QueryCache::default_cache());

        let first = embedder.embed("fase lútea").unwrap();
        let second = embedder.embed("fase lútea").unwrap();
        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(first.embedding, second.embedding);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        assert_eq!(embedder.dimension(), 2);
    }

    #[test]
    fn test_health_check_bypasses_cache() {
        let backend = Arc::new(CountingEmbedder {
            calls: AtomicUsize::new(0),
        });
        let embedder = CachedEmbedder::new(backend.clone(), QueryCache::default_cache());

        assert!(embedder.health_check().is_ok());
        assert!(embedder.health_check().is_ok());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
        assert!(embedder.cache().is_empty());
    }
}
