//! Completion provider trait for tool-calling chat models

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::Result;
use crate::types::{ChatMessage, ToolCall};

/// Function tool offered to the model
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments object
    pub parameters: Value,
}

impl ToolDefinition {
    /// OpenAI `tools[]` entry
    pub fn to_wire(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
    }
}

/// First choice of a completion
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

impl Completion {
    /// Plain text completion
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }
}

/// Trait for chat-completion APIs
///
/// Implementations:
/// - `OpenAiClient`: OpenAI-compatible `/chat/completions`
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Run one completion over `messages`; `tools` may be empty
    async fn complete(&self, messages: &[ChatMessage], tools: &[ToolDefinition]) -> Result<Completion>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
