//! MCP error taxonomy
//!
//! Connection errors are fatal to their server (and to startup); invocation
//! errors stay local to one tool call and never tear the session down.

use std::path::PathBuf;
use thiserror::Error;

/// Errors establishing or tearing down a session
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Unsupported server script (expected .py or .js): {0}")]
    UnsupportedServer(PathBuf),

    #[error("Failed to launch server process: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("MCP handshake failed: {0}")]
    Handshake(String),

    #[error("Tool discovery failed: {0}")]
    Discovery(String),

    #[error("Session close failed: {0}")]
    Close(String),
}

/// Errors during one tool invocation round-trip
///
/// None of these close the session; the next call on the same session is
/// allowed to succeed.
#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("MCP transport error: {0}")]
    Transport(String),

    #[error("Tool arguments must be a JSON object, got: {0}")]
    InvalidArguments(String),

    #[error("Session is closed")]
    SessionClosed,
}

/// Errors surfaced by the dispatcher
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Tool '{name}' not found in any connected server")]
    ToolNotFound { name: String },

    #[error("Tool '{name}' failed: {source}")]
    Invocation {
        name: String,
        #[source]
        source: InvocationError,
    },
}
