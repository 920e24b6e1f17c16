//! Ollama embedding provider
//!
//! Runs a multilingual sentence-embedding model on a local Ollama server so
//! semantic retrieval works without a hosted embedding API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};

use super::embedding::{non_empty, EmbeddingProvider};
use super::retry::{retry_with_backoff, Failure};

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

/// Ollama embedding provider
pub struct OllamaEmbedder {
    client: Client,
    base_url: String,
    model: String,
    dimensions: usize,
    max_retries: u32,
}

impl OllamaEmbedder {
    /// Create a new Ollama embedder
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            dimensions: config.dimensions,
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);

        retry_with_backoff("Ollama embedding", self.max_retries, || {
            let request = self.client.post(&url).json(&EmbedRequest {
                model: &self.model,
                prompt: text,
            });

            async move {
                let response = request.send().await.map_err(|e| {
                    Failure::Transient(Error::embedding(format!("Embedding request failed: {}", e)))
                })?;

                let status = response.status();
                if !status.is_success() {
                    return Err(Failure::from_status(
                        status,
                        Error::embedding(format!("Embedding failed: HTTP {}", status)),
                    ));
                }

                let embed_response: EmbedResponse = response.json().await.map_err(|e| {
                    Failure::Permanent(Error::embedding(format!(
                        "Failed to parse embedding response: {}",
                        e
                    )))
                })?;

                non_empty(embed_response.embedding, "ollama").map_err(Failure::Permanent)
            }
        })
        .await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
