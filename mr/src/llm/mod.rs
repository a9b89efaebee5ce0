//! LLM client module for mcprepl
//!
//! Provides the completion request/response types and the Anthropic client.
//! Conversation message types live in chatstore so the persisted log and the
//! API payload share one shape.

mod anthropic;
pub mod client;
mod error;
mod types;

pub use anthropic::AnthropicClient;
pub use client::LlmClient;
pub use error::LlmError;
pub use types::{CompletionRequest, CompletionResponse, StopReason, TokenUsage, ToolDefinition};

pub use chatstore::{ContentBlock, Message, MessageContent, Role};
