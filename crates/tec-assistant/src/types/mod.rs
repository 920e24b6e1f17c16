//! Core types for the assistant

pub mod message;
pub mod request;

pub use message::{ChatMessage, ContentPart, FunctionCall, MessageContent, Role, ToolCall};
pub use request::{ChatRequest, ChatResponse, CliInput, SearchRequest, SearchResponse};
