//! Application state for the assistant server

use parking_lot::RwLock;
use std::sync::Arc;

use crate::agent::Assistant;
use crate::config::{AssistantConfig, RetrievalStrategy};
use crate::error::{Error, Result};
use crate::knowledge::Corpus;
use crate::providers::{build_embedder, CompletionProvider, OpenAiClient};
use crate::retrieval::{build_retriever, Retriever};
use crate::sessions::{InMemorySessionStore, SessionStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: AssistantConfig,
    /// Retriever selected by `retrieval.strategy`
    retriever: Arc<dyn Retriever>,
    /// Completion loop; absent when no completion API is configured
    assistant: Option<Assistant>,
    /// Conversation history per session
    sessions: Arc<dyn SessionStore>,
    /// Ready state
    ready: RwLock<bool>,
}

impl AppState {
    /// Create application state from configuration
    ///
    /// Loads the corpus, embeds it when semantic retrieval is selected, and
    /// connects the completion client. Without an API key the server still
    /// starts, but only `/api/search` can answer.
    pub async fn new(config: AssistantConfig) -> Result<Self> {
        tracing::info!(
            "Initializing assistant state (strategy: {})...",
            config.retrieval.strategy
        );

        let corpus = Arc::new(Corpus::load(config.knowledge.path.as_deref())?);
        tracing::info!("Knowledge corpus loaded ({} records)", corpus.len());

        let embedder = match config.retrieval.strategy {
            RetrievalStrategy::Semantic => Some(build_embedder(&config.embeddings)?),
            RetrievalStrategy::Keyword => None,
        };
        let retriever = build_retriever(&config.retrieval, corpus, embedder).await?;

        let assistant = match OpenAiClient::new(&config.llm) {
            Ok(client) => {
                tracing::info!("Completion provider: {} (model: {})", client.name(), client.model());
                let llm: Arc<dyn CompletionProvider> = Arc::new(client);
                Some(Assistant::new(llm, Arc::clone(&retriever)))
            }
            Err(e) => {
                tracing::warn!("Chat disabled: {}", e);
                None
            }
        };

        let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new(&config.sessions));

        let state = Self::from_parts(config, retriever, assistant, sessions);
        state.refresh_readiness().await;
        Ok(state)
    }

    /// Assemble state from already-built collaborators
    pub fn from_parts(
        config: AssistantConfig,
        retriever: Arc<dyn Retriever>,
        assistant: Option<Assistant>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                retriever,
                assistant,
                sessions,
                ready: RwLock::new(true),
            }),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &AssistantConfig {
        &self.inner.config
    }

    /// Get retriever
    pub fn retriever(&self) -> &Arc<dyn Retriever> {
        &self.inner.retriever
    }

    /// Get knowledge corpus
    pub fn corpus(&self) -> &Corpus {
        self.inner.retriever.corpus()
    }

    /// Get the assistant, or an error when chat is not configured
    pub fn assistant(&self) -> Result<&Assistant> {
        self.inner
            .assistant
            .as_ref()
            .ok_or_else(|| Error::llm("completion provider is not configured"))
    }

    /// Get session store
    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.inner.sessions
    }

    /// Check if the server is ready
    pub fn is_ready(&self) -> bool {
        *self.inner.ready.read()
    }

    /// Set ready state
    pub fn set_ready(&self, ready: bool) {
        *self.inner.ready.write() = ready;
    }

    /// Health-check the providers behind the retriever and the assistant
    ///
    /// An unreachable provider, or a check that errors, marks the server
    /// not ready. Returns the new ready state.
    pub async fn refresh_readiness(&self) -> bool {
        let retriever_ok = match self.inner.retriever.health_check().await {
            Ok(healthy) => healthy,
            Err(e) => {
                tracing::warn!("Retriever health check failed: {}", e);
                false
            }
        };

        let llm_ok = match &self.inner.assistant {
            Some(assistant) => match assistant.llm().health_check().await {
                Ok(healthy) => healthy,
                Err(e) => {
                    tracing::warn!("Completion health check failed: {}", e);
                    false
                }
            },
            None => true,
        };

        let ready = retriever_ok && llm_ok;
        if ready != self.is_ready() {
            if ready {
                tracing::info!("Server ready");
            } else {
                tracing::warn!(
                    "Server not ready (retriever: {}, completion: {})",
                    retriever_ok,
                    llm_ok
                );
            }
        }
        self.set_ready(ready);
        ready
    }
}
