//! Ollama text generation client.

use std::time::Duration;

use cyclesage_core::{Error, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

pub const GENERATE_TIMEOUT: Duration = Duration::from_secs(120);
pub const TAGS_TIMEOUT: Duration = Duration::from_secs(10);

/// Prompt in, completion out.
///
/// An empty string means the generation failed; implementations log the
/// cause instead of returning it. Each call is attempted once.
pub trait Generator: Send + Sync {
    fn generate(&self, prompt: &str) -> String;

    /// Whether the generation endpoint answers at all.
    fn test_connection(&self) -> bool;
}

pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: impl AsRef<str>, model: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| Error::Http(format!("failed to build generation client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.as_ref().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// One generation request, surfacing the failure reason.
    pub fn try_generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };
        let resp = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .timeout(GENERATE_TIMEOUT)
            .json(&request)
            .send()
            .map_err(|e| Error::Generation(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(Error::Generation(format!("status {status}: {body}")));
        }

        let parsed: GenerateResponse = resp
            .json()
            .map_err(|e| Error::Generation(format!("bad response: {e}")))?;
        Ok(parsed.response.trim().to_string())
    }

    /// Model names the server reports as installed.
    pub fn list_models(&self) -> Result<Vec<String>> {
        let resp = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(TAGS_TIMEOUT)
            .send()
            .map_err(|e| Error::Connection(format!("ollama unreachable: {e}")))?;
        if !resp.status().is_success() {
            return Err(Error::Connection(format!("ollama status {}", resp.status())));
        }
        let tags: TagsResponse = resp
            .json()
            .map_err(|e| Error::Generation(format!("bad tags response: {e}")))?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

impl Generator for OllamaClient {
    fn generate(&self, prompt: &str) -> String {
        debug!("Generating with {} ({} chars of prompt)", self.model, prompt.len());
        match self.try_generate(prompt) {
            Ok(text) => text,
            Err(e) => {
                error!("Generation failed: {}", e);
                String::new()
            }
        }
    }

    fn test_connection(&self) -> bool {
        match self.list_models() {
            Ok(models) => {
                let tagged = format!("{}:", self.model);
                if !models
                    .iter()
                    .any(|m| m == &self.model || m.starts_with(&tagged))
                {
                    warn!("Model {} not installed on {}", self.model, self.base_url);
                }
                true
            }
            Err(e) => {
                warn!("Ollama connection check failed: {}", e);
                false
            }
        }
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}
