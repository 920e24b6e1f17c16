//! Keyword containment retrieval
//!
//! A record scores one point for every keyword that occurs as a substring of
//! the case-folded query. The strictly highest score wins; on equal scores
//! the record that comes first in corpus order wins. A query with no hits
//! resolves to the corpus fallback.

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::RetrievalStrategy;
use crate::error::Result;
use crate::knowledge::{Corpus, KnowledgeRecord};

use super::{Retrieval, Retriever};

/// Best-scoring record and its keyword hit count
///
/// Keywords must already be case-folded (`Corpus` guarantees this).
/// Returns `None` when no record has a hit.
pub fn best_match<'a>(query: &str, records: &'a [KnowledgeRecord]) -> Option<(&'a KnowledgeRecord, usize)> {
    let normalized = query.to_lowercase();
    let mut best: Option<(&KnowledgeRecord, usize)> = None;

    for record in records {
        let hits = record
            .keywords
            .iter()
            .filter(|keyword| normalized.contains(keyword.as_str()))
            .count();

        // strict comparison keeps the earliest record on ties
        if hits > best.map_or(0, |(_, count)| count) {
            best = Some((record, hits));
        }
    }

    best
}

/// Answer text for `query`, or the fallback when nothing matches
pub fn retrieve(query: &str, corpus: &Corpus) -> String {
    match best_match(query, corpus.records()) {
        Some((record, _)) => record.answer.clone(),
        None => corpus.fallback().to_string(),
    }
}

/// Strategy A retriever over a shared corpus
pub struct KeywordRetriever {
    corpus: Arc<Corpus>,
}

impl KeywordRetriever {
    pub fn new(corpus: Arc<Corpus>) -> Self {
        Self { corpus }
    }

    /// Synchronous search; keyword matching never suspends
    pub fn search_sync(&self, query: &str) -> Retrieval {
        match best_match(query, self.corpus.records()) {
            Some((record, hits)) => {
                tracing::debug!("Keyword match: {} ({} hits)", record.category, hits);
                Retrieval::Matched {
                    category: record.category.clone(),
                    answer: record.answer.clone(),
                    score: hits as f32,
                }
            }
            None => {
                tracing::debug!("Keyword search found no match");
                Retrieval::NoMatch
            }
        }
    }
}

#[async_trait]
impl Retriever for KeywordRetriever {
    async fn search(&self, query: &str) -> Result<Retrieval> {
        Ok(self.search_sync(query))
    }

    fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    fn strategy(&self) -> RetrievalStrategy {
        RetrievalStrategy::Keyword
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Corpus {
        let record = |category: &str, keywords: &[&str]| KnowledgeRecord {
            category: category.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            answer: format!("{} answer", category),
        };
        Corpus::new(
            vec![
                record("admission", &["admission", "register"]),
                record("fees", &["fees", "tuition", "register"]),
                record("contact", &["Phone", "email"]),
            ],
            "Nothing found. Call 0798877440",
            "0798877440",
        )
        .unwrap()
    }

    #[test]
    fn test_single_category() {
        assert_eq!(retrieve("what is the tuition", &corpus()), "fees answer");
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(retrieve("PHONE number please", &corpus()), "contact answer");
        assert_eq!(retrieve("E-mail or EMAIL?", &corpus()), "contact answer");
    }

    #[test]
    fn test_highest_count_wins_over_corpus_order() {
        // admission: register (1); fees: register + tuition (2)
        assert_eq!(retrieve("register and pay tuition", &corpus()), "fees answer");
    }

    #[test]
    fn test_tie_resolves_to_corpus_order() {
        // admission: admission (1); fees: fees (1)
        let corpus = corpus();
        for _ in 0..5 {
            assert_eq!(retrieve("admission fees", &corpus), "admission answer");
        }
    }

    #[test]
    fn test_repeated_keyword_counts_once() {
        let record = |category: &str, keywords: &[&str]| KnowledgeRecord {
            category: category.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            answer: format!("{} answer", category),
        };
        let corpus = Corpus::new(
            vec![
                record("fees", &["Fees", "fees"]),
                record("admission", &["register", "admission"]),
            ],
            "Nothing found. Call 0798877440",
            "0798877440",
        )
        .unwrap();

        // fees: 1 distinct hit; admission: 2
        assert_eq!(retrieve("admission register fees", &corpus), "admission answer");
    }

    #[test]
    fn test_no_match_returns_fallback() {
        let answer = retrieve("asdkjasjd random gibberish", &corpus());
        assert!(answer.contains("0798877440"));
    }

    #[test]
    fn test_empty_query() {
        assert!(best_match("", corpus().records()).is_none());
        assert_eq!(retrieve("", &corpus()), corpus().fallback());
    }

    #[test]
    fn test_retriever_reports_hits() {
        let retriever = KeywordRetriever::new(Arc::new(corpus()));
        let outcome = tokio_test::block_on(retriever.search("register, tuition and fees")).unwrap();
        assert_eq!(
            outcome,
            Retrieval::Matched {
                category: "fees".to_string(),
                answer: "fees answer".to_string(),
                score: 3.0,
            }
        );
    }
}
