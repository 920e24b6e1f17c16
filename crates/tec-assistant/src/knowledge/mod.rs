//! Static knowledge corpus
//!
//! The corpus is a single JSON artifact: an ordered list of records plus the
//! fallback message returned when nothing matches. It is loaded once at
//! startup and shared read-only behind an `Arc`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::error::{Error, Result};

/// Corpus bundled with the crate
const BUILTIN_CORPUS: &str = include_str!("../../data/knowledge_base.json");

/// One category of prewritten knowledge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeRecord {
    /// Unique category identifier
    pub category: String,
    /// Keywords matched case-insensitively against queries
    pub keywords: Vec<String>,
    /// Answer text returned on match
    pub answer: String,
}

/// On-disk layout of the corpus file
#[derive(Debug, Deserialize)]
struct CorpusFile {
    contact_phone: String,
    fallback: String,
    records: Vec<KnowledgeRecord>,
}

/// Ordered, validated, immutable set of knowledge records
#[derive(Debug, Clone)]
pub struct Corpus {
    records: Vec<KnowledgeRecord>,
    fallback: String,
    contact_phone: String,
}

impl Corpus {
    /// Build and validate a corpus
    ///
    /// Keywords are case-folded and trimmed here so matching only needs to
    /// fold the query.
    pub fn new(
        records: Vec<KnowledgeRecord>,
        fallback: impl Into<String>,
        contact_phone: impl Into<String>,
    ) -> Result<Self> {
        let fallback = fallback.into();
        let contact_phone = contact_phone.into();

        if contact_phone.trim().is_empty() {
            return Err(Error::corpus("contact_phone must not be empty"));
        }
        if !fallback.contains(&contact_phone) {
            return Err(Error::corpus(format!(
                "fallback message must contain the contact phone {}",
                contact_phone
            )));
        }

        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(records.len());

        for record in records {
            if record.category.trim().is_empty() {
                return Err(Error::corpus("record with empty category"));
            }
            if !seen.insert(record.category.clone()) {
                return Err(Error::corpus(format!(
                    "duplicate category '{}'",
                    record.category
                )));
            }
            if record.answer.trim().is_empty() {
                return Err(Error::corpus(format!(
                    "category '{}' has an empty answer",
                    record.category
                )));
            }

            // keywords form a set: a repeated keyword must not score twice
            let mut distinct = HashSet::new();
            let keywords: Vec<String> = record
                .keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty() && distinct.insert(k.clone()))
                .collect();

            if keywords.is_empty() {
                return Err(Error::corpus(format!(
                    "category '{}' has no keywords",
                    record.category
                )));
            }

            normalized.push(KnowledgeRecord { keywords, ..record });
        }

        Ok(Self {
            records: normalized,
            fallback,
            contact_phone,
        })
    }

    /// Parse a corpus from JSON text
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let file: CorpusFile = serde_json::from_str(raw)
            .map_err(|e| Error::corpus(format!("invalid corpus JSON: {}", e)))?;
        Self::new(file.records, file.fallback, file.contact_phone)
    }

    /// Load a corpus from a JSON file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::corpus(format!("failed to read {}: {}", path.display(), e)))?;
        let corpus = Self::from_json_str(&raw)?;
        tracing::info!(
            "Loaded {} knowledge records from {}",
            corpus.len(),
            path.display()
        );
        Ok(corpus)
    }

    /// The corpus bundled with the crate
    pub fn builtin() -> Result<Self> {
        Self::from_json_str(BUILTIN_CORPUS)
    }

    /// Load from `path` if given, else the bundled corpus
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_path(path),
            None => Self::builtin(),
        }
    }

    /// Records in canonical (tie-break) order
    pub fn records(&self) -> &[KnowledgeRecord] {
        &self.records
    }

    /// Look up a record by category
    pub fn get(&self, category: &str) -> Option<&KnowledgeRecord> {
        self.records.iter().find(|r| r.category == category)
    }

    /// Message returned when retrieval finds nothing
    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Default contact phone number
    pub fn contact_phone(&self) -> &str {
        &self.contact_phone
    }

    /// Apology shown to users when a provider fails
    pub fn apology(&self) -> String {
        format!(
            "عذراً، حدث خطأ. يمكنك التواصل مع الجامعة على: {}",
            self.contact_phone
        )
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
