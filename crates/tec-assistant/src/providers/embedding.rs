//! Sentence embeddings for semantic retrieval

use async_trait::async_trait;

use crate::error::{Error, Result};

/// Maps text to a dense vector
///
/// Query and record vectors must come from the same provider and model, or
/// cosine scores are meaningless.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, preserving input order
    ///
    /// The default issues one request per text.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for (i, text) in texts.iter().enumerate() {
            let embedding = self.embed(text).await?;
            tracing::debug!("Embedded text {}/{} ({} dims)", i + 1, texts.len(), embedding.len());
            embeddings.push(embedding);
        }
        Ok(embeddings)
    }

    /// Configured vector width
    fn dimensions(&self) -> usize;

    async fn health_check(&self) -> Result<bool>;

    fn name(&self) -> &str;
}

/// Reject an empty vector returned by a provider
pub(crate) fn non_empty(embedding: Vec<f32>, provider: &str) -> Result<Vec<f32>> {
    if embedding.is_empty() {
        return Err(Error::embedding(format!("{} returned an empty embedding", provider)));
    }
    Ok(embedding)
}
