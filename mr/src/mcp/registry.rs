//! Registry of connected sessions
//!
//! Sessions are kept in connection order. The merged tool catalog is the
//! concatenation of every session's tools in that order, duplicates included;
//! name resolution scans the same order and stops at the first match, so an
//! earlier server shadows a later one for dispatch without hiding the later
//! tool from the catalog.

use tracing::{debug, warn};

use crate::llm::ToolDefinition;

use super::error::ConnectionError;
use super::session::McpSession;

/// One row of the merged catalog, annotated with its owning session
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub session_identity: String,
    pub tool: ToolDefinition,
}

/// Owns every connected session, in connection order
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Vec<McpSession>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a session; its tools go to the end of the catalog
    pub fn push(&mut self, session: McpSession) {
        debug!(identity = %session.identity(), tool_count = session.tools().len(), "push: called");
        self.sessions.push(session);
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Merged tool catalog, for the LLM request
    ///
    /// Duplicate names are preserved as-is.
    pub fn catalog(&self) -> Vec<ToolDefinition> {
        self.sessions.iter().flat_map(|s| s.tools().iter().cloned()).collect()
    }

    /// Merged catalog annotated with each tool's owning session
    pub fn annotated_catalog(&self) -> Vec<CatalogEntry> {
        self.sessions
            .iter()
            .flat_map(|session| {
                session.tools().iter().map(|tool| CatalogEntry {
                    session_identity: session.identity().to_string(),
                    tool: tool.clone(),
                })
            })
            .collect()
    }

    /// First session (in connection order) that provides `name`
    pub fn resolve(&self, name: &str) -> Option<&McpSession> {
        self.sessions
            .iter()
            .find(|session| session.tools().iter().any(|tool| tool.name == name))
    }

    /// Close every session in reverse connection order
    ///
    /// Every session gets a close attempt even when earlier ones fail; the
    /// failures come back paired with the session they belong to.
    pub async fn shutdown(mut self) -> Vec<(String, ConnectionError)> {
        debug!(session_count = self.sessions.len(), "shutdown: called");
        let mut failures = Vec::new();
        while let Some(mut session) = self.sessions.pop() {
            if let Err(e) = session.close().await {
                warn!(identity = %session.identity(), error = %e, "shutdown: session close failed");
                failures.push((session.identity().to_string(), e));
            }
        }
        failures
    }
}
