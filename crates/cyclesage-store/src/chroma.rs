//! Chroma REST (v1) adapter.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use cyclesage_core::{Error, Result};
use cyclesage_infer::EmbedderBackend;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, error, info, warn};

use crate::metadata::clean_metadata;
use crate::types::{ContentChunk, QueryHit};
use crate::KnowledgeStore;

const COLLECTION_DESCRIPTION: &str =
    "Base de conocimientos sobre salud femenina y ciclo menstrual";

/// A resolved collection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CollectionHandle {
    pub id: String,
    pub name: String,
}

/// Blocking client bound to one Chroma collection.
pub struct ChromaStore {
    client: Client,
    base_url: String,
    collection: CollectionHandle,
    embedder: Arc<dyn EmbedderBackend>,
}

impl ChromaStore {
    /// Check the server heartbeat and resolve (or create) the collection.
    ///
    /// Any failure here is fatal for the caller: the pipeline cannot run
    /// without a reachable store.
    pub fn connect(
        base_url: impl AsRef<str>,
        collection: &str,
        embedder: Arc<dyn EmbedderBackend>,
    ) -> Result<Self> {
        let base_url = base_url.as_ref().trim_end_matches('/').to_string();
        let client = Client::builder()
            .build()
            .map_err(|e| Error::Http(format!("failed to build Chroma client: {e}")))?;

        heartbeat(&client, &base_url)?;
        let collection = ensure_collection(&client, &base_url, collection)?;
        info!(
            "Connected to Chroma at {} (collection {})",
            base_url, collection.name
        );

        Ok(Self {
            client,
            base_url,
            collection,
            embedder,
        })
    }

    pub fn collection(&self) -> &CollectionHandle {
        &self.collection
    }

    /// Fetch or create a collection by name. Idempotent.
    pub fn ensure_collection(&self, name: &str) -> Result<CollectionHandle> {
        ensure_collection(&self.client, &self.base_url, name)
    }

    /// Whether the server answers its heartbeat.
    pub fn is_alive(&self) -> bool {
        heartbeat(&self.client, &self.base_url).is_ok()
    }

    fn collection_url(&self, op: &str) -> String {
        format!(
            "{}/api/v1/collections/{}/{}",
            self.base_url, self.collection.id, op
        )
    }

    fn try_add(&self, chunks: &[&ContentChunk]) -> Result<()> {
        let body = AddRequest {
            ids: chunks.iter().map(|c| c.chunk_id.as_str()).collect(),
            embeddings: chunks
                .iter()
                .map(|c| c.embedding.as_ref().map(|e| e.to_vec()).unwrap_or_default())
                .collect(),
            documents: chunks.iter().map(|c| c.content.as_str()).collect(),
            metadatas: chunks
                .iter()
                .map(|c| clean_metadata(c.store_metadata()))
                .collect(),
        };
        let resp = self
            .client
            .post(self.collection_url("add"))
            .json(&body)
            .send()
            .map_err(|e| Error::VectorStore(format!("add request failed: {e}")))?;
        check_status(resp).map(|_| ())
    }

    fn try_query(&self, embeddings: Vec<Vec<f32>>, k: usize) -> Result<Vec<QueryHit>> {
        let body = json!({
            "query_embeddings": embeddings,
            "n_results": k,
            "include": ["documents", "metadatas", "distances"],
        });
        let resp = self
            .client
            .post(self.collection_url("query"))
            .json(&body)
            .send()
            .map_err(|e| Error::VectorStore(format!("query request failed: {e}")))?;
        let parsed: QueryResponse = check_status(resp)?
            .json()
            .map_err(|e| Error::VectorStore(format!("bad query response: {e}")))?;
        Ok(merge_hits(parsed, k))
    }

    fn try_count(&self) -> Result<usize> {
        let resp = self
            .client
            .get(self.collection_url("count"))
            .send()
            .map_err(|e| Error::VectorStore(format!("count request failed: {e}")))?;
        check_status(resp)?
            .json()
            .map_err(|e| Error::VectorStore(format!("bad count response: {e}")))
    }
}

impl KnowledgeStore for ChromaStore {
    fn add(&self, chunks: &[ContentChunk]) -> usize {
        let valid: Vec<&ContentChunk> = chunks.iter().filter(|c| c.has_embedding()).collect();
        let skipped = chunks.len() - valid.len();
        if skipped > 0 {
            warn!("Skipping {} chunks without a valid embedding", skipped);
        }
        let valid = unique_by_id(valid);
        if valid.is_empty() {
            warn!("No valid chunks to store");
            return 0;
        }

        match self.try_add(&valid) {
            Ok(()) => {
                info!("Stored {} chunks in {}", valid.len(), self.collection.name);
                valid.len()
            }
            Err(e) => {
                error!("Failed to store chunks: {}", e);
                0
            }
        }
    }

    fn query_many(&self, texts: &[&str], k: usize) -> Vec<QueryHit> {
        if texts.is_empty() || k == 0 {
            return Vec::new();
        }
        let embeddings: Vec<Vec<f32>> = self
            .embedder
            .embed_batch(texts)
            .into_iter()
            .flatten()
            .map(|r| r.embedding.to_vec())
            .collect();
        if embeddings.is_empty() {
            warn!("No query text could be embedded; returning no context");
            return Vec::new();
        }
        debug!("Querying {} with {} embeddings", self.collection.name, embeddings.len());

        self.try_query(embeddings, k).unwrap_or_else(|e| {
            error!("Query failed: {}", e);
            Vec::new()
        })
    }

    fn count(&self) -> usize {
        self.try_count().unwrap_or_else(|e| {
            error!("Count failed: {}", e);
            0
        })
    }
}

/// Keep the first chunk of each id; Chroma rejects an add with repeats.
fn unique_by_id(chunks: Vec<&ContentChunk>) -> Vec<&ContentChunk> {
    let total = chunks.len();
    let mut seen = HashSet::new();
    let unique: Vec<&ContentChunk> = chunks
        .into_iter()
        .filter(|&c| seen.insert(c.chunk_id.as_str()))
        .collect();
    if unique.len() < total {
        info!("Dropped {} repeated chunks", total - unique.len());
    }
    unique
}

fn heartbeat(client: &Client, base_url: &str) -> Result<()> {
    let resp = client
        .get(format!("{base_url}/api/v1/heartbeat"))
        .send()
        .map_err(|e| Error::Connection(format!("vector store unreachable at {base_url}: {e}")))?;
    if !resp.status().is_success() {
        return Err(Error::Connection(format!(
            "vector store heartbeat returned {}",
            resp.status()
        )));
    }
    Ok(())
}

fn ensure_collection(client: &Client, base_url: &str, name: &str) -> Result<CollectionHandle> {
    let body = json!({
        "name": name,
        "metadata": {"description": COLLECTION_DESCRIPTION},
        "get_or_create": true,
    });
    let resp = client
        .post(format!("{base_url}/api/v1/collections"))
        .json(&body)
        .send()
        .map_err(|e| Error::Connection(format!("collection request failed: {e}")))?;
    let resp = check_status(resp).map_err(|e| Error::Connection(e.to_string()))?;
    resp.json()
        .map_err(|e| Error::Connection(format!("bad collection response: {e}")))
}

fn check_status(resp: reqwest::blocking::Response) -> Result<reqwest::blocking::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp
        .text()
        .unwrap_or_else(|_| "<body unavailable>".to_string());
    Err(Error::VectorStore(format!("status {status}: {body}")))
}

/// Flatten per-query result lists into one list: each id once at its
/// smallest distance, nearest first, at most `k`.
fn merge_hits(resp: QueryResponse, k: usize) -> Vec<QueryHit> {
    let mut best: HashMap<String, QueryHit> = HashMap::new();

    for (q, ids) in resp.ids.into_iter().enumerate() {
        for (i, id) in ids.into_iter().enumerate() {
            let document = nested(&resp.documents, q, i).cloned().flatten();
            let Some(document) = document else { continue };
            let metadata = nested(&resp.metadatas, q, i)
                .cloned()
                .flatten()
                .unwrap_or_default();
            let distance = nested(&resp.distances, q, i).copied().unwrap_or(f32::MAX);

            let hit = QueryHit {
                id: id.clone(),
                document,
                metadata,
                distance,
            };
            match best.get(&id) {
                Some(existing) if existing.distance <= distance => {}
                _ => {
                    best.insert(id, hit);
                }
            }
        }
    }

    let mut hits: Vec<QueryHit> = best.into_values().collect();
    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance).then_with(|| a.id.cmp(&b.id)));
    hits.truncate(k);
    hits
}

fn nested<T>(lists: &Option<Vec<Vec<T>>>, q: usize, i: usize) -> Option<&T> {
    lists.as_ref()?.get(q)?.get(i)
}

#[derive(Serialize)]
struct AddRequest<'a> {
    ids: Vec<&'a str>,
    embeddings: Vec<Vec<f32>>,
    documents: Vec<&'a str>,
    metadatas: Vec<Map<String, Value>>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    ids: Vec<Vec<String>>,
    #[serde(default)]
    documents: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    metadatas: Option<Vec<Vec<Option<Map<String, Value>>>>>,
    #[serde(default)]
    distances: Option<Vec<Vec<f32>>>,
}
