//! tec-assistant: Tec, the Amman Arab University website assistant
//!
//! Answers visitor questions from a small curated knowledge corpus. Retrieval
//! runs either by keyword containment or by embedding similarity, and a
//! tool-calling chat model turns the retrieved answers into replies. The crate
//! ships an HTTP server and a one-shot JSON CLI.

pub mod agent;
pub mod config;
pub mod error;
pub mod image;
pub mod knowledge;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod sessions;
pub mod types;

pub use agent::{Assistant, AssistantReply};
pub use config::{AssistantConfig, RetrievalStrategy};
pub use error::{Error, Result};
pub use knowledge::{Corpus, KnowledgeRecord};
pub use retrieval::{build_retriever, Retrieval, Retriever};
pub use sessions::{InMemorySessionStore, SessionStore};
pub use types::{ChatMessage, ChatRequest, ChatResponse};
