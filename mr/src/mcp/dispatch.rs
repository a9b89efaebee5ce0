//! Tool dispatch over the session registry

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::llm::ToolDefinition;

use super::error::{ConnectionError, DispatchError};
use super::registry::SessionRegistry;
use super::session::ToolOutcome;

/// Routing seam between the turn loop and the MCP layer
///
/// The turn loop only needs the merged catalog and a way to run one named
/// tool call; tests substitute a scripted implementation here.
#[async_trait]
pub trait ToolDispatch: Send + Sync {
    /// Merged tool catalog across all sessions, in connection order
    fn catalog(&self) -> Vec<ToolDefinition>;

    /// Run one tool call on the first session that provides `name`
    async fn dispatch(&self, name: &str, arguments: Value) -> Result<ToolOutcome, DispatchError>;
}

/// Dispatcher that owns the live session registry
pub struct ToolDispatcher {
    registry: SessionRegistry,
}

impl ToolDispatcher {
    pub fn new(registry: SessionRegistry) -> Self {
        Self { registry }
    }

    pub fn session_count(&self) -> usize {
        self.registry.len()
    }

    /// Close every session in reverse connection order
    pub async fn shutdown(self) -> Vec<(String, ConnectionError)> {
        self.registry.shutdown().await
    }
}

#[async_trait]
impl ToolDispatch for ToolDispatcher {
    fn catalog(&self) -> Vec<ToolDefinition> {
        self.registry.catalog()
    }

    async fn dispatch(&self, name: &str, arguments: Value) -> Result<ToolOutcome, DispatchError> {
        debug!(%name, "dispatch: called");
        let session = self.registry.resolve(name).ok_or_else(|| DispatchError::ToolNotFound {
            name: name.to_string(),
        })?;

        session
            .invoke(name, arguments)
            .await
            .map_err(|source| DispatchError::Invocation {
                name: name.to_string(),
                source,
            })
    }
}
