//! Provider abstractions for embeddings and chat completions
//!
//! Both collaborators sit behind traits so the retriever and the agent can be
//! driven by hosted APIs in production and by in-process fakes in tests.

pub mod embedding;
pub mod llm;
pub mod ollama;
pub mod openai;
mod retry;

use std::sync::Arc;

use crate::config::{EmbeddingBackend, EmbeddingConfig};
use crate::error::Result;

pub use embedding::EmbeddingProvider;
pub use llm::{Completion, CompletionProvider, ToolDefinition};
pub use ollama::OllamaEmbedder;
pub use openai::{OpenAiClient, OpenAiEmbedder};

/// Build the embedding provider selected in config
pub fn build_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let embedder: Arc<dyn EmbeddingProvider> = match config.provider {
        EmbeddingBackend::OpenAi => Arc::new(OpenAiEmbedder::new(config)?),
        EmbeddingBackend::Ollama => Arc::new(OllamaEmbedder::new(config)?),
    };
    tracing::info!(
        "Embedding provider: {} (model: {}, dimensions: {})",
        embedder.name(),
        config.model,
        config.dimensions
    );
    Ok(embedder)
}
