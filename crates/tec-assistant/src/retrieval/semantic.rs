//! Embedding similarity retrieval
//!
//! Record embeddings are computed once when the retriever is built; each
//! query costs a single embedding call plus one cosine comparison per record.

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::RetrievalStrategy;
use crate::error::{Error, Result};
use crate::knowledge::Corpus;
use crate::providers::EmbeddingProvider;

use super::{Retrieval, Retriever};

/// Cosine similarity in [-1, 1]; zero-magnitude vectors score 0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Index and score of the most similar embedding; earlier entries win ties
pub fn most_similar(query: &[f32], embeddings: &[Vec<f32>]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;

    for (i, embedding) in embeddings.iter().enumerate() {
        let score = cosine_similarity(query, embedding);
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((i, score));
        }
    }

    best
}

/// Strategy B retriever over a shared corpus
pub struct SemanticRetriever {
    corpus: Arc<Corpus>,
    embedder: Arc<dyn EmbeddingProvider>,
    record_embeddings: Vec<Vec<f32>>,
    threshold: f32,
}

impl SemanticRetriever {
    /// Embed every record answer and build the retriever
    pub async fn new(
        corpus: Arc<Corpus>,
        embedder: Arc<dyn EmbeddingProvider>,
        threshold: f32,
    ) -> Result<Self> {
        let answers: Vec<String> = corpus.records().iter().map(|r| r.answer.clone()).collect();

        tracing::info!(
            "Embedding {} knowledge records with {}",
            answers.len(),
            embedder.name()
        );
        let record_embeddings = embedder.embed_batch(&answers).await?;

        Self::with_embeddings(corpus, embedder, record_embeddings, threshold)
    }

    /// Build from precomputed record embeddings (one per record, corpus order)
    pub fn with_embeddings(
        corpus: Arc<Corpus>,
        embedder: Arc<dyn EmbeddingProvider>,
        record_embeddings: Vec<Vec<f32>>,
        threshold: f32,
    ) -> Result<Self> {
        if record_embeddings.len() != corpus.len() {
            return Err(Error::embedding(format!(
                "expected {} record embeddings, got {}",
                corpus.len(),
                record_embeddings.len()
            )));
        }

        let expected = embedder.dimensions();
        if let Some(bad) = record_embeddings.iter().find(|e| e.len() != expected) {
            return Err(Error::embedding(format!(
                "{} returned {}-dimensional embeddings, configured for {} (check embeddings.dimensions)",
                embedder.name(),
                bad.len(),
                expected
            )));
        }

        Ok(Self {
            corpus,
            embedder,
            record_embeddings,
            threshold,
        })
    }
}

#[async_trait]
impl Retriever for SemanticRetriever {
    async fn search(&self, query: &str) -> Result<Retrieval> {
        let query_embedding = self.embedder.embed(query).await?;

        if query_embedding.len() != self.embedder.dimensions() {
            return Err(Error::embedding(format!(
                "query embedding has {} dimensions, corpus has {}",
                query_embedding.len(),
                self.embedder.dimensions()
            )));
        }

        let Some((index, score)) = most_similar(&query_embedding, &self.record_embeddings) else {
            return Ok(Retrieval::NoMatch);
        };

        let record = &self.corpus.records()[index];
        tracing::debug!(
            "Semantic best match: {} (similarity {:.3}, threshold {:.3})",
            record.category,
            score,
            self.threshold
        );

        if score > self.threshold {
            Ok(Retrieval::Matched {
                category: record.category.clone(),
                answer: record.answer.clone(),
                score,
            })
        } else {
            Ok(Retrieval::NoMatch)
        }
    }

    fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    fn strategy(&self) -> RetrievalStrategy {
        RetrievalStrategy::Semantic
    }

    async fn health_check(&self) -> Result<bool> {
        self.embedder.health_check().await
    }
}
