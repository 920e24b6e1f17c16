//! OpenAI-compatible chat-completion and embedding clients

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::{EmbeddingConfig, LlmConfig};
use crate::error::{Error, Result};
use crate::types::{ChatMessage, ToolCall};

use super::embedding::{non_empty, EmbeddingProvider};
use super::llm::{Completion, CompletionProvider, ToolDefinition};
use super::retry::{retry_with_backoff, Failure};

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

fn require_key(key: Option<&String>, what: &str) -> Result<String> {
    match key {
        Some(key) if !key.trim().is_empty() => Ok(key.clone()),
        _ => Err(Error::Config(format!(
            "{} requires an API key (set OPENAI_API_KEY)",
            what
        ))),
    }
}

fn build_http_client(timeout_secs: u64) -> Result<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .pool_max_idle_per_host(5)
        .build()?)
}

/// Build the chat-completions request body
///
/// `tool_choice` is only sent when tools are offered.
pub(crate) fn completion_body(
    model: &str,
    temperature: f32,
    messages: &[ChatMessage],
    tools: &[ToolDefinition],
) -> Result<Value> {
    let mut body = json!({
        "model": model,
        "temperature": temperature,
        "messages": serde_json::to_value(messages)?,
    });

    if !tools.is_empty() {
        body["tools"] = Value::Array(tools.iter().map(ToolDefinition::to_wire).collect());
        body["tool_choice"] = json!("auto");
    }

    Ok(body)
}

/// Chat-completion client with automatic retry
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_retries: u32,
}

impl OpenAiClient {
    /// Create a new client; fails when no API key is configured
    pub fn new(config: &LlmConfig) -> Result<Self> {
        Ok(Self {
            client: build_http_client(config.timeout_secs)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: require_key(config.api_key.as_ref(), "completion API")?,
            model: config.model.clone(),
            temperature: config.temperature,
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    async fn complete(&self, messages: &[ChatMessage], tools: &[ToolDefinition]) -> Result<Completion> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = completion_body(&self.model, self.temperature, messages, tools)?;

        tracing::debug!(
            "Completion request: model={} messages={} tools={}",
            self.model,
            messages.len(),
            tools.len()
        );

        retry_with_backoff("Completion request", self.max_retries, || {
            let request = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&body);

            async move {
                let response = request.send().await.map_err(|e| {
                    Failure::Transient(Error::llm(format!("Completion request failed: {}", e)))
                })?;

                if !response.status().is_success() {
                    let status = response.status();
                    let text = response.text().await.unwrap_or_default();
                    return Err(Failure::from_status(
                        status,
                        Error::llm(format!("Completion failed: HTTP {} - {}", status, text)),
                    ));
                }

                let parsed: ChatCompletionResponse = response.json().await.map_err(|e| {
                    Failure::Permanent(Error::llm(format!(
                        "Failed to parse completion response: {}",
                        e
                    )))
                })?;

                let choice = parsed.choices.into_iter().next().ok_or_else(|| {
                    Failure::Permanent(Error::llm("No choices in completion response"))
                })?;

                Ok(Completion {
                    content: choice.message.content,
                    tool_calls: choice.message.tool_calls.unwrap_or_default(),
                })
            }
        })
        .await
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/models", self.base_url);
        match self.client.get(&url).bearer_auth(&self.api_key).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Embedding client for OpenAI-compatible `/embeddings`
pub struct OpenAiEmbedder {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    dimensions: usize,
    max_retries: u32,
}

impl OpenAiEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        Ok(Self {
            client: build_http_client(config.timeout_secs)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: require_key(config.api_key.as_ref(), "embedding API")?,
            model: config.model.clone(),
            dimensions: config.dimensions,
            max_retries: config.max_retries,
        })
    }

    async fn request(&self, input: Value) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.base_url);
        let body = json!({ "model": self.model, "input": input });

        retry_with_backoff("Embedding request", self.max_retries, || {
            let request = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&body);

            async move {
                let response = request.send().await.map_err(|e| {
                    Failure::Transient(Error::embedding(format!("Embedding request failed: {}", e)))
                })?;

                if !response.status().is_success() {
                    let status = response.status();
                    let text = response.text().await.unwrap_or_default();
                    return Err(Failure::from_status(
                        status,
                        Error::embedding(format!("Embedding failed: HTTP {} - {}", status, text)),
                    ));
                }

                let mut parsed: EmbeddingResponse = response.json().await.map_err(|e| {
                    Failure::Permanent(Error::embedding(format!(
                        "Failed to parse embedding response: {}",
                        e
                    )))
                })?;

                parsed.data.sort_by_key(|d| d.index);
                parsed
                    .data
                    .into_iter()
                    .map(|d| non_empty(d.embedding, "openai"))
                    .collect::<Result<Vec<_>>>()
                    .map_err(Failure::Permanent)
            }
        })
        .await
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.request(json!(text))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::embedding("Empty embedding response"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let embeddings = self.request(json!(texts)).await?;
        if embeddings.len() != texts.len() {
            return Err(Error::embedding(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                embeddings.len()
            )));
        }
        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/models", self.base_url);
        match self.client.get(&url).bearer_auth(&self.api_key).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_api_key() {
        let config = LlmConfig::default();
        assert!(matches!(OpenAiClient::new(&config), Err(Error::Config(_))));

        let config = LlmConfig {
            api_key: Some("sk-test".to_string()),
            ..LlmConfig::default()
        };
        assert!(OpenAiClient::new(&config).is_ok());
    }

    #[test]
    fn test_completion_body_with_tools() {
        let tool = ToolDefinition {
            name: "search_aau_knowledge".to_string(),
            description: "search".to_string(),
            parameters: json!({"type": "object"}),
        };
        let messages = vec![ChatMessage::system("sys"), ChatMessage::user("hi")];

        let body = completion_body("gpt-4.1-mini", 0.7, &messages, &[tool]).unwrap();
        assert_eq!(body["model"], "gpt-4.1-mini");
        assert_eq!(body["tool_choice"], "auto");
        assert_eq!(body["tools"][0]["function"]["name"], "search_aau_knowledge");
        assert_eq!(body["messages"][1]["role"], "user");

        let body = completion_body("gpt-4.1-mini", 0.7, &messages, &[]).unwrap();
        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());
    }

    #[test]
    fn test_parse_tool_call_response() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":null,
            "tool_calls":[{"id":"call_1","type":"function",
            "function":{"name":"search_aau_knowledge","arguments":"{\"query\":\"رسوم\"}"}}]}}]}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(raw).unwrap();
        let message = &parsed.choices[0].message;
        assert!(message.content.is_none());
        let calls = message.tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].function.name, "search_aau_knowledge");
    }
}
