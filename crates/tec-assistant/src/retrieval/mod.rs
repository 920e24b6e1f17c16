//! Knowledge retrieval over the static corpus
//!
//! Two interchangeable strategies implement [`Retriever`]:
//! - [`KeywordRetriever`]: substring keyword hits, best count wins
//! - [`SemanticRetriever`]: cosine similarity between embeddings
//!
//! Both return a single answer string and fall back to the corpus default
//! message when nothing clears the acceptance bar. A provider failure is an
//! `Err`, never a fallback, so callers can tell "could not search" apart
//! from "searched, found nothing".

pub mod keyword;
pub mod semantic;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{RetrievalConfig, RetrievalStrategy};
use crate::error::{Error, Result};
use crate::knowledge::Corpus;
use crate::providers::EmbeddingProvider;

pub use keyword::KeywordRetriever;
pub use semantic::{cosine_similarity, SemanticRetriever};

/// Outcome of a single retrieval
#[derive(Debug, Clone, PartialEq)]
pub enum Retrieval {
    /// A record cleared the acceptance bar
    Matched {
        category: String,
        answer: String,
        /// Keyword hit count (keyword) or cosine similarity (semantic)
        score: f32,
    },
    /// Nothing matched; render the fallback
    NoMatch,
}

impl Retrieval {
    /// Answer text, or `fallback` when nothing matched
    pub fn into_answer(self, fallback: &str) -> String {
        match self {
            Retrieval::Matched { answer, .. } => answer,
            Retrieval::NoMatch => fallback.to_string(),
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, Retrieval::Matched { .. })
    }
}

/// Retrieval strategy over an immutable corpus
///
/// Implementations hold no mutable state, so one instance can serve
/// concurrent requests without locking.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Structured search result
    async fn search(&self, query: &str) -> Result<Retrieval>;

    /// Corpus this retriever searches
    fn corpus(&self) -> &Corpus;

    /// Strategy name for logging and health output
    fn strategy(&self) -> RetrievalStrategy;

    /// Whether the collaborators behind this retriever are reachable
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    /// Answer text for `query`; the corpus fallback when nothing matches
    async fn retrieve(&self, query: &str) -> Result<String> {
        let outcome = self.search(query).await?;
        Ok(outcome.into_answer(self.corpus().fallback()))
    }
}

/// Build the retriever selected in config
///
/// Semantic retrieval needs an embedder and embeds the corpus up front.
pub async fn build_retriever(
    config: &RetrievalConfig,
    corpus: Arc<Corpus>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
) -> Result<Arc<dyn Retriever>> {
    let retriever: Arc<dyn Retriever> = match config.strategy {
        RetrievalStrategy::Keyword => Arc::new(KeywordRetriever::new(corpus)),
        RetrievalStrategy::Semantic => {
            let embedder = embedder.ok_or_else(|| {
                Error::Config("semantic retrieval requires an embedding provider".to_string())
            })?;
            Arc::new(SemanticRetriever::new(corpus, embedder, config.similarity_threshold).await?)
        }
    };

    tracing::info!(
        "Retriever ready: {} strategy over {} records",
        retriever.strategy(),
        retriever.corpus().len()
    );
    Ok(retriever)
}
