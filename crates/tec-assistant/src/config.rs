//! Configuration for the assistant

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Upper bound for provider retry counts
pub const MAX_RETRIES: u32 = 10;

/// Main assistant configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Completion API configuration
    #[serde(default)]
    pub llm: LlmConfig,
    /// Embedding configuration (semantic retrieval only)
    #[serde(default)]
    pub embeddings: EmbeddingConfig,
    /// Retrieval strategy configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    /// Knowledge corpus location
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
    /// Session store configuration
    #[serde(default)]
    pub sessions: SessionConfig,
}

impl AssistantConfig {
    /// Load configuration from a TOML file
    ///
    /// Missing sections fall back to their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(format!("Invalid config: {}", e)))
    }

    /// Load from `path` when given, else from the default location if it exists,
    /// else use defaults. Environment overrides are applied last.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Default config location (`~/.config/tec-assistant/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tec-assistant").join("config.toml"))
    }

    /// Overlay environment variables onto the loaded configuration
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("OPENAI_API_KEY").filter(|k| !k.is_empty()) {
            self.llm.api_key = Some(key.clone());
            if self.embeddings.api_key.is_none() {
                self.embeddings.api_key = Some(key);
            }
        }
        if let Some(url) = lookup("OPENAI_BASE_URL").filter(|u| !u.is_empty()) {
            self.llm.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(model) = lookup("TEC_MODEL").filter(|m| !m.is_empty()) {
            self.llm.model = model;
        }
        if let Some(port) = lookup("PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid PORT value: {}", port),
            }
        }
        if let Some(strategy) = lookup("TEC_RETRIEVAL_STRATEGY") {
            match strategy.to_lowercase().as_str() {
                "keyword" => self.retrieval.strategy = RetrievalStrategy::Keyword,
                "semantic" => self.retrieval.strategy = RetrievalStrategy::Semantic,
                other => tracing::warn!("Ignoring unknown retrieval strategy: {}", other),
            }
        }
        if let Some(path) = lookup("TEC_KNOWLEDGE_PATH").filter(|p| !p.is_empty()) {
            self.knowledge.path = Some(PathBuf::from(path));
        }
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        let threshold = self.retrieval.similarity_threshold;
        if !(-1.0..=1.0).contains(&threshold) {
            return Err(Error::Config(format!(
                "similarity_threshold must be within [-1, 1], got {}",
                threshold
            )));
        }
        if self.server.port == 0 {
            return Err(Error::Config("server.port must be nonzero".to_string()));
        }
        if self.sessions.max_sessions == 0 || self.sessions.max_messages == 0 {
            return Err(Error::Config(
                "sessions.max_sessions and sessions.max_messages must be positive".to_string(),
            ));
        }
        if self.llm.max_retries > MAX_RETRIES || self.embeddings.max_retries > MAX_RETRIES {
            return Err(Error::Config(format!(
                "max_retries must be at most {}",
                MAX_RETRIES
            )));
        }
        if self.embeddings.dimensions == 0 {
            return Err(Error::Config("embeddings.dimensions must be positive".to_string()));
        }
        if self.sessions.ttl_secs == 0 {
            return Err(Error::Config("sessions.ttl_secs must be positive".to_string()));
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum request body size in bytes (images arrive inline as base64)
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5001,
            enable_cors: true,
            max_body_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// Chat-completion API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// OpenAI-compatible base URL
    pub base_url: String,
    /// API key (usually supplied through `OPENAI_API_KEY`)
    pub api_key: Option<String>,
    /// Completion model name
    pub model: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4.1-mini".to_string(),
            temperature: 0.7,
            timeout_secs: 60,
            max_retries: 2,
        }
    }
}

/// Embedding backend
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// OpenAI-compatible `/embeddings`
    #[default]
    OpenAi,
    /// Local Ollama server
    Ollama,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Which backend produces embeddings
    pub provider: EmbeddingBackend,
    /// Base URL for the backend
    pub base_url: String,
    /// API key for OpenAI-compatible backends
    pub api_key: Option<String>,
    /// Multilingual embedding model
    pub model: String,
    /// Embedding dimensions
    pub dimensions: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingBackend::OpenAi,
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
            timeout_secs: 30,
            max_retries: 2,
        }
    }
}

/// Retrieval strategy selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalStrategy {
    /// Keyword containment with best match count
    #[default]
    Keyword,
    /// Cosine similarity over embeddings
    Semantic,
}

impl std::fmt::Display for RetrievalStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetrievalStrategy::Keyword => f.write_str("keyword"),
            RetrievalStrategy::Semantic => f.write_str("semantic"),
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Matching strategy
    pub strategy: RetrievalStrategy,
    /// Acceptance threshold for semantic matches (best score must exceed it)
    pub similarity_threshold: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            strategy: RetrievalStrategy::Keyword,
            similarity_threshold: 0.5,
        }
    }
}

/// Knowledge corpus configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeConfig {
    /// Path to a corpus JSON file; the bundled corpus is used when unset
    pub path: Option<PathBuf>,
}

/// Session store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Idle time after which a session expires
    pub ttl_secs: u64,
    /// Maximum number of live sessions
    pub max_sessions: usize,
    /// Maximum messages kept per session
    pub max_messages: usize,
    /// Interval between background purges of expired sessions
    pub purge_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 3600, // 1 hour
            max_sessions: 1000,
            max_messages: 50,
            purge_interval_secs: 300,
        }
    }
}
