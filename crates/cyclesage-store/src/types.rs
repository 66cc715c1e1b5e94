//! Data types for chunks, document metadata, and query results.

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Number of hex characters kept from the content hash.
pub const CHUNK_ID_LEN: usize = 12;

/// How a source document was read and how big it was.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub source_file: String,
    pub file_size: u64,
    pub total_pages: usize,
    /// `pdf_extract`, `lopdf_fallback` or `plain_text`.
    pub extraction_method: String,
}

/// Tags computed for a chunk from its text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub applicable_phases: Vec<String>,
    pub applicable_segments: Vec<String>,
    pub emotional_relevance: Vec<String>,
    pub primary_topics: Vec<String>,
    pub content_type: String,
    pub urgency_level: String,
    pub confidence_score: f64,
    pub processing_method: String,
}

impl Default for ChunkMetadata {
    fn default() -> Self {
        Self {
            applicable_phases: Vec::new(),
            applicable_segments: Vec::new(),
            emotional_relevance: Vec::new(),
            primary_topics: Vec::new(),
            content_type: "educational".to_string(),
            urgency_level: "normal".to_string(),
            confidence_score: 0.5,
            processing_method: "local_extraction".to_string(),
        }
    }
}

/// A unit of extracted document text, ready to embed and store.
#[derive(Debug, Clone)]
pub struct ContentChunk {
    pub chunk_id: String,
    pub content: String,
    pub metadata: ChunkMetadata,
    pub document: DocumentMetadata,
    pub embedding: Option<Array1<f32>>,
}

impl ContentChunk {
    pub fn new(content: String, metadata: ChunkMetadata, document: DocumentMetadata) -> Self {
        Self {
            chunk_id: content_id(&content),
            content,
            metadata,
            document,
            embedding: None,
        }
    }

    pub fn source_document(&self) -> &str {
        &self.document.source_file
    }

    /// Whether the chunk carries a non-empty embedding.
    pub fn has_embedding(&self) -> bool {
        self.embedding.as_ref().is_some_and(|e| !e.is_empty())
    }

    /// Chunk tags merged with the document metadata, before flattening.
    pub fn store_metadata(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut map = match serde_json::to_value(&self.metadata) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };
        if let Ok(serde_json::Value::Object(doc)) = serde_json::to_value(&self.document) {
            map.extend(doc);
        }
        map
    }
}

/// Deterministic identifier of a chunk text: the first 12 hex characters
/// of its SHA-256 digest.
pub fn content_id(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let mut id = hex::encode(digest);
    id.truncate(CHUNK_ID_LEN);
    id
}

/// One ranked query result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryHit {
    pub id: String,
    pub document: String,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    /// Distance reported by the store; smaller is closer.
    pub distance: f32,
}
