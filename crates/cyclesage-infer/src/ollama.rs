//! Embeddings served by an Ollama-compatible `/api/embeddings` endpoint.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use cyclesage_core::{Error, Result};
use ndarray::Array1;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::embedder::{EmbedderBackend, EmbeddingResult, HEALTH_CHECK_TEXT};

const EMBED_TIMEOUT: Duration = Duration::from_secs(60);

/// Blocking embeddings client for an Ollama-compatible server.
pub struct OllamaEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    dim: AtomicUsize,
    /// Cleared by a failed health check.
    available: AtomicBool,
}

impl OllamaEmbedder {
    pub fn new(base_url: impl AsRef<str>, model: impl Into<String>) -> Result<Self> {
        let model = model.into();
        if model.trim().is_empty() {
            return Err(Error::Config("missing embedding model name".into()));
        }
        let client = Client::builder()
            .timeout(EMBED_TIMEOUT)
            .build()
            .map_err(|e| Error::Http(format!("failed to build embedding client: {e}")))?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/embeddings", base_url.as_ref().trim_end_matches('/')),
            model,
            dim: AtomicUsize::new(0),
            available: AtomicBool::new(true),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Request one embedding, surfacing the failure reason.
    pub fn try_embed(&self, text: &str) -> Result<Array1<f32>> {
        let request = EmbeddingRequest {
            model: &self.model,
            prompt: text,
        };
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .map_err(|e| Error::Embedding(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(Error::Embedding(format!("status {status}: {body}")));
        }

        let parsed: EmbeddingResponse = resp
            .json()
            .map_err(|e| Error::Embedding(format!("bad response: {e}")))?;
        if parsed.embedding.is_empty() {
            return Err(Error::Embedding("empty embedding".into()));
        }
        self.dim.store(parsed.embedding.len(), Ordering::Relaxed);
        Ok(Array1::from_vec(parsed.embedding))
    }
}

impl EmbedderBackend for OllamaEmbedder {
    fn embed(&self, text: &str) -> Option<EmbeddingResult> {
        match self.try_embed(text) {
            Ok(embedding) => Some(EmbeddingResult {
                embedding,
                cached: false,
            }),
            Err(e) => {
                warn!("Embedding failed: {}", e);
                None
            }
        }
    }

    fn dimension(&self) -> usize {
        self.dim.load(Ordering::Relaxed)
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::Relaxed)
    }

    fn health_check(&self) -> Result<()> {
        let result = self.try_embed(HEALTH_CHECK_TEXT).map(|_| ());
        self.available.store(result.is_ok(), Ordering::Relaxed);
        result
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use cyclesage_core::testing;

    #[test]
    fn test_embed_parses_vector() {
        let (url, server) = testing::serve_once(200, r#"{"embedding":[0.5,0.25,-1.0]}"#);
        let embedder = OllamaEmbedder::new(&url, "paraphrase-multilingual").unwrap();

        let result = embedder.embed("hola").unwrap();
        assert_eq!(result.embedding.len(), 3);
        assert!(!result.cached);
        assert_eq!(embedder.dimension(), 3);

        let requests = server.join().unwrap();
        assert_eq!(requests[0].path, "/api/embeddings");
        assert_eq!(requests[0].json()["prompt"], "hola");
        assert_eq!(requests[0].json()["model"], "paraphrase-multilingual");
    }

    #[test]
    fn test_server_error_is_none() {
        let (url, server) = testing::serve_once(500, r#"{"error":"model not loaded"}"#);
        let embedder = OllamaEmbedder::new(&url, "m").unwrap();
        assert!(embedder.embed("hola").is_none());
        server.join().unwrap();
    }

    #[test]
    fn test_unreachable_is_none() {
        let embedder = OllamaEmbedder::new(testing::closed_port_url(), "m").unwrap();
        assert!(embedder.embed("hola").is_none());
        assert_eq!(embedder.dimension(), 0);
    }

    #[test]
    fn test_health_check_reports_unreachable_model() {
        let embedder = OllamaEmbedder::new(testing::closed_port_url(), "m").unwrap();
        assert!(embedder.is_available());

        let err = embedder.health_check().unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
        assert!(!embedder.is_available());
    }

    #[test]
    fn test_health_check_ok() {
        let (url, server) = testing::serve_once(200, r#"{"embedding":[0.1,0.2]}"#);
        let embedder = OllamaEmbedder::new(&url, "m").unwrap();
        assert!(embedder.health_check().is_ok());
        assert!(embedder.is_available());
        assert_eq!(server.join().unwrap()[0].json()["prompt"], HEALTH_CHECK_TEXT);
    }

    #[test]
    fn test_empty_model_rejected() {
        assert!(OllamaEmbedder::new("http://localhost:11434", " ").is_err());
    }
}
