//! mcprepl - multi-session MCP tool orchestrator
//!
//! Connects to any number of independently-running MCP servers, merges their
//! tools into one ordered catalog, and drives an interactive chat loop: user
//! queries go to the LLM with the full catalog, requested tool calls are
//! confirmed by the operator (or auto-approved) and executed one at a time,
//! and every message is durably persisted via chatstore before the next model
//! call.
//!
//! # Core Concepts
//!
//! - **Sessions in connection order**: the tool catalog is the concatenation
//!   of each server's tools; when two servers expose the same tool name, the
//!   first-connected one wins dispatch.
//! - **Sequential turns**: at most one tool call is in flight; the model is
//!   never re-invoked until the previous result is on disk.
//! - **Shutdown as unwinding**: sessions close in reverse connection order on
//!   every exit path - normal, error, or interrupt.
//!
//! # Modules
//!
//! - [`llm`] - LLM client trait and Anthropic implementation
//! - [`mcp`] - MCP sessions, the session registry, and tool dispatch
//! - [`repl`] - interactive loop, turn engine, and tool confirmation
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod cli;
pub mod config;
pub mod llm;
pub mod mcp;
pub mod repl;

// Re-export commonly used types
pub use chatstore::{ChatLog, ChatStore, ContentBlock, Message, MessageContent, Role};
pub use config::{Config, LlmConfig, ServerConfig};
pub use llm::{AnthropicClient, CompletionRequest, CompletionResponse, LlmClient, LlmError, ToolDefinition};
pub use mcp::{
    CatalogEntry, ConnectionError, DispatchError, InvocationError, McpSession, SessionRegistry, SessionState,
    ToolDispatch, ToolDispatcher, ToolOutcome,
};
pub use repl::{Approver, AutoApprove, Decision, PendingToolCall, ReplSession, TurnEngine, TurnOutcome};
