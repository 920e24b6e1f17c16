//! Request and response envelopes for the HTTP and CLI surfaces

use serde::{Deserialize, Serialize};

use super::message::ChatMessage;

/// POST /api/chat body
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    /// User message
    #[serde(default)]
    pub message: String,
    /// Existing session; a new one is created when absent
    #[serde(default, alias = "sessionId")]
    pub session_id: Option<String>,
    /// Optional image as a data URL or raw base64
    #[serde(default, alias = "imageUrl")]
    pub image_url: Option<String>,
}

/// POST /api/chat response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
}

/// POST /api/search body
#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: Option<String>,
}

/// POST /api/search response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Matched answer text or the fallback message
    pub answer: String,
    /// Whether a record cleared the acceptance bar
    pub matched: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Keyword hit count or cosine similarity, depending on strategy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

/// JSON document read by the CLI in `--stdin` mode
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CliInput {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "conversationHistory", alias = "conversation_history")]
    pub conversation_history: Option<Vec<ChatMessage>>,
    #[serde(default, rename = "imageUrl", alias = "image_url")]
    pub image_url: Option<String>,
}
