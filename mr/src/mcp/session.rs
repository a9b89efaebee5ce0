//! One session per connected MCP server
//!
//! A session owns the child process transport for one server: it spawns the
//! process, performs the rmcp handshake, discovers the server's tools, and
//! then serves synchronous invoke round-trips until it is closed.

use std::process::Stdio;

use rmcp::model::CallToolRequestParams;
use rmcp::service::{RoleClient, RunningService, serve_client};
use rmcp::transport::child_process::TokioChildProcess;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::llm::ToolDefinition;

use super::error::{ConnectionError, InvocationError};

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Ready,
    Closed,
}

/// The result of one tool invocation
///
/// `is_error` marks an application-level failure reported by the server for
/// this specific call; the invocation round-trip itself succeeded.
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    pub content: String,
    pub is_error: bool,
}

enum Transport {
    Live(RunningService<RoleClient, ()>),
    Detached,
    #[cfg(test)]
    Stub(stub::StubTransport),
}

/// A live connection to one external tool-providing process
pub struct McpSession {
    identity: String,
    transport: Transport,
    tools: Vec<ToolDefinition>,
    state: SessionState,
}

impl McpSession {
    /// Connect to an MCP server: spawn, handshake, discover tools
    ///
    /// Completes (or fails) before any tool call is attempted. The server
    /// script's extension picks the interpreter, as the config format only
    /// supports python and node servers.
    pub async fn connect(server: &ServerConfig) -> Result<Self, ConnectionError> {
        let identity = server.path.display().to_string();
        info!(identity, name = %server.name, "Connecting to MCP server");

        let interpreter = match server.path.extension().and_then(|e| e.to_str()) {
            Some("py") => "python",
            Some("js") => "node",
            _ => return Err(ConnectionError::UnsupportedServer(server.path.clone())),
        };

        let mut command = Command::new(interpreter);
        command
            .arg(&server.path)
            .kill_on_drop(true)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped());

        let (transport, stderr) = TokioChildProcess::builder(command).stderr(Stdio::piped()).spawn()?;

        // Surface the server's stderr in our log instead of the REPL
        if let Some(stderr) = stderr {
            let server_name = server.name.clone();
            tokio::spawn(async move {
                let mut reader = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = reader.next_line().await {
                    debug!("MCP server stderr ({server_name}): {line}");
                }
            });
        }

        let service = serve_client((), transport)
            .await
            .map_err(|e| ConnectionError::Handshake(e.to_string()))?;

        let listed = service
            .list_tools(None)
            .await
            .map_err(|e| ConnectionError::Discovery(e.to_string()))?;

        let tools: Vec<ToolDefinition> = listed
            .tools
            .iter()
            .map(|tool| {
                ToolDefinition::new(
                    tool.name.to_string(),
                    tool.description.as_deref().unwrap_or_default().to_string(),
                    Value::Object((*tool.input_schema).clone()),
                )
            })
            .collect();

        info!(identity, tool_count = tools.len(), "MCP server connected");
        Ok(Self {
            identity,
            transport: Transport::Live(service),
            tools,
            state: SessionState::Ready,
        })
    }

    /// This session's launch identity (the server script path)
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Tools discovered at connect time, in server order
    pub fn tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Perform one synchronous tool invocation round-trip
    ///
    /// May suspend indefinitely on transport I/O. Failures here are local to
    /// the call: the session stays usable.
    pub async fn invoke(&self, name: &str, arguments: Value) -> Result<ToolOutcome, InvocationError> {
        debug!(identity = %self.identity, %name, "invoke: called");
        match &self.transport {
            Transport::Live(service) => {
                let arguments = match arguments {
                    Value::Object(map) => Some(map),
                    Value::Null => None,
                    other => return Err(InvocationError::InvalidArguments(other.to_string())),
                };

                let result = service
                    .call_tool(CallToolRequestParams {
                        meta: None,
                        task: None,
                        name: name.to_string().into(),
                        arguments,
                    })
                    .await
                    .map_err(|e| InvocationError::Transport(e.to_string()))?;

                Ok(flatten_result(result))
            }
            Transport::Detached => Err(InvocationError::SessionClosed),
            #[cfg(test)]
            Transport::Stub(stub) => stub.invoke(name),
        }
    }

    /// Release the transport and terminate the server process
    ///
    /// Idempotent, and safe to call on a session whose connect only partially
    /// completed.
    pub async fn close(&mut self) -> Result<(), ConnectionError> {
        self.state = SessionState::Closed;
        match std::mem::replace(&mut self.transport, Transport::Detached) {
            Transport::Live(service) => {
                info!(identity = %self.identity, "Closing MCP session");
                service
                    .cancel()
                    .await
                    .map(|_| ())
                    .map_err(|e| ConnectionError::Close(e.to_string()))
            }
            Transport::Detached => Ok(()),
            #[cfg(test)]
            Transport::Stub(stub) => {
                if let Some(log) = &stub.close_log {
                    log.lock().unwrap().push(self.identity.clone());
                }
                if stub.fail_close {
                    Err(ConnectionError::Close("stub close failure".to_string()))
                } else {
                    Ok(())
                }
            }
        }
    }
}

/// Flatten an MCP call result into one displayable/persistable payload
///
/// Text content blocks are joined; a structured-only result falls back to its
/// JSON rendering.
fn flatten_result(result: rmcp::model::CallToolResult) -> ToolOutcome {
    let mut parts: Vec<String> = result
        .content
        .iter()
        .filter_map(|block| block.as_text().map(|t| t.text.clone()))
        .collect();

    if parts.is_empty()
        && let Some(structured) = &result.structured_content
    {
        parts.push(structured.to_string());
    }

    let is_error = result.is_error.unwrap_or(false);
    if is_error {
        warn!("flatten_result: server reported tool error");
    }

    ToolOutcome {
        content: parts.join("\n"),
        is_error,
    }
}


#[cfg(test)]
impl McpSession {
    /// Test-only session with a scripted transport
    pub(crate) fn stubbed(identity: &str, tools: Vec<ToolDefinition>, transport: stub::StubTransport) -> Self {
        Self {
            identity: identity.to_string(),
            transport: Transport::Stub(transport),
            tools,
            state: SessionState::Ready,
        }
    }

    /// Test-only session with no transport at all
    pub(crate) fn detached(identity: &str, tools: Vec<ToolDefinition>) -> Self {
        Self {
            identity: identity.to_string(),
            transport: Transport::Detached,
            tools,
            state: SessionState::Ready,
        }
    }
}
