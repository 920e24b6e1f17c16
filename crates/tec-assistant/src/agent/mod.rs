//! Tool-calling completion loop
//!
//! One user turn costs at most two completion calls: the first offers the
//! knowledge tool, and if the model calls it the retrieved answers are fed
//! back for a second, tool-free call that produces the reply.

pub mod prompt;
pub mod tools;

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::image::ImageInput;
use crate::providers::{Completion, CompletionProvider};
use crate::retrieval::Retriever;
use crate::types::{ChatMessage, ToolCall};

pub use prompt::{PromptBuilder, SYSTEM_PROMPT};
pub use tools::{parse_search_args, search_tool, SEARCH_TOOL};

/// Final answer plus the turns to persist in the session
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantReply {
    pub answer: String,
    /// User text turn and assistant answer, in that order
    pub turns: Vec<ChatMessage>,
    /// Number of knowledge lookups the model made
    pub tool_calls: usize,
}

/// Tec assistant: completion provider plus knowledge retriever
#[derive(Clone)]
pub struct Assistant {
    llm: Arc<dyn CompletionProvider>,
    retriever: Arc<dyn Retriever>,
}

impl Assistant {
    pub fn new(llm: Arc<dyn CompletionProvider>, retriever: Arc<dyn Retriever>) -> Self {
        Self { llm, retriever }
    }

    pub fn llm(&self) -> &Arc<dyn CompletionProvider> {
        &self.llm
    }

    /// Answer `message` in the context of `history`
    pub async fn reply(
        &self,
        history: &[ChatMessage],
        message: &str,
        image: Option<&ImageInput>,
    ) -> Result<AssistantReply> {
        let message = message.trim();
        if message.is_empty() {
            return Err(Error::malformed("message is empty"));
        }

        let mut messages = PromptBuilder::transcript(history, message, image);
        let tools = [search_tool()];

        let first = self.llm.complete(&messages, &tools).await?;

        let (answer, tool_calls) = if first.tool_calls.is_empty() {
            (first.content, 0)
        } else {
            let count = first.tool_calls.len();
            self.run_tools(&mut messages, first).await?;
            let second = self.llm.complete(&messages, &[]).await?;
            (second.content, count)
        };

        let answer = answer
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| Error::llm("completion returned an empty answer"))?;

        tracing::info!(
            "Reply ready ({} chars, {} tool calls, image: {})",
            answer.chars().count(),
            tool_calls,
            image.is_some()
        );

        Ok(AssistantReply {
            turns: vec![ChatMessage::user(message), ChatMessage::assistant(answer.clone())],
            answer,
            tool_calls,
        })
    }

    /// Append the tool-call turn and one tool result per call
    async fn run_tools(&self, messages: &mut Vec<ChatMessage>, completion: Completion) -> Result<()> {
        let calls = completion.tool_calls;
        messages.push(ChatMessage::assistant_tool_calls(completion.content, calls.clone()));

        for call in &calls {
            let result = self.run_tool(call).await?;
            messages.push(ChatMessage::tool(&call.id, &call.function.name, result));
        }

        Ok(())
    }

    async fn run_tool(&self, call: &ToolCall) -> Result<String> {
        match call.function.name.as_str() {
            SEARCH_TOOL => {
                let query = parse_search_args(&call.function.arguments)?;
                tracing::debug!("Knowledge lookup: \"{}\"", query);
                self.retriever.retrieve(&query).await
            }
            other => {
                tracing::warn!("Model called unknown tool: {}", other);
                Ok(format!("Unknown tool: {}", other))
            }
        }
    }
}
