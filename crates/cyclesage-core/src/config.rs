//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CHROMA_HOST: &str = "localhost";
pub const DEFAULT_CHROMA_PORT: u16 = 8000;
pub const DEFAULT_COLLECTION: &str = "salud_femenina_knowledge";
pub const DEFAULT_OLLAMA_HOST: &str = "localhost";
pub const DEFAULT_OLLAMA_PORT: u16 = 11434;
pub const DEFAULT_OLLAMA_MODEL: &str = "salud-femenina";
pub const DEFAULT_EMBEDDING_MODEL: &str = "paraphrase-multilingual";
/// Upper bound of words per chunk window.
pub const DEFAULT_MAX_CHUNK_WORDS: usize = 400;
/// Lower bound of the "well-sized chunk" range used for confidence scoring.
pub const DEFAULT_MIN_CHUNK_WORDS: usize = 100;

/// Paths to all CycleSage data directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Source documents waiting to be processed (`data/pdfs/`).
    pub pdfs: PathBuf,
    /// Documents already written to the vector store (`data/processed/`).
    pub processed: PathBuf,
    /// Generated content and catalog snapshots (`data/exports/`).
    pub exports: PathBuf,
}

impl DataPaths {
    /// Derive data paths from a root directory. Does not touch the filesystem.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            pdfs: root.join("pdfs"),
            processed: root.join("processed"),
            exports: root.join("exports"),
            root,
        }
    }

    /// Create all data directories.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.pdfs)?;
        std::fs::create_dir_all(&self.processed)?;
        std::fs::create_dir_all(&self.exports)?;
        Ok(())
    }
}

/// Location of an external HTTP service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Base URL without trailing slash, e.g. `http://localhost:8000`.
    pub fn base_url(&self) -> String {
        if self.host.starts_with("http://") || self.host.starts_with("https://") {
            format!("{}:{}", self.host.trim_end_matches('/'), self.port)
        } else {
            format!("http://{}:{}", self.host, self.port)
        }
    }
}

/// Top-level CycleSage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleSageConfig {
    /// Chroma vector store.
    pub chroma: Endpoint,
    /// Collection holding the processed medical documents.
    pub collection: String,
    /// Ollama generation endpoint.
    pub ollama: Endpoint,
    /// Model used for content generation.
    pub ollama_model: String,
    /// Endpoint serving sentence embeddings (Ollama-compatible).
    pub embedding: Endpoint,
    /// Embedding model name.
    pub embedding_model: String,
    /// Maximum words per chunk window.
    pub max_chunk_words: usize,
    /// Minimum words of a well-sized chunk.
    pub min_chunk_words: usize,
    /// Data directory paths.
    pub data_paths: DataPaths,
}

impl CycleSageConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable lookup.
    ///
    /// Unparseable numeric values fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let string = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        let port = |key: &str, default: u16| {
            lookup(key)
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(default)
        };
        let count = |key: &str, default: usize| {
            lookup(key)
                .and_then(|p| p.trim().parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(default)
        };

        let ollama = Endpoint::new(
            string("OLLAMA_HOST", DEFAULT_OLLAMA_HOST),
            port("OLLAMA_PORT", DEFAULT_OLLAMA_PORT),
        );
        let embedding = Endpoint::new(
            string("EMBEDDING_HOST", &ollama.host),
            port("EMBEDDING_PORT", ollama.port),
        );

        Self {
            chroma: Endpoint::new(
                string("CHROMA_HOST", DEFAULT_CHROMA_HOST),
                port("CHROMA_PORT", DEFAULT_CHROMA_PORT),
            ),
            collection: string("CHROMA_COLLECTION", DEFAULT_COLLECTION),
            ollama_model: string("OLLAMA_MODEL", DEFAULT_OLLAMA_MODEL),
            embedding_model: string("EMBEDDING_MODEL", DEFAULT_EMBEDDING_MODEL),
            max_chunk_words: count("MAX_CHUNK_SIZE", DEFAULT_MAX_CHUNK_WORDS),
            min_chunk_words: count("MIN_CHUNK_SIZE", DEFAULT_MIN_CHUNK_WORDS),
            data_paths: DataPaths::new(string("CYCLESAGE_DATA_DIR", "data")),
            ollama,
            embedding,
        }
    }
}

impl Default for CycleSageConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
