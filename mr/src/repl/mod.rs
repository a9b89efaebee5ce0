//! Interactive REPL for mcprepl
//!
//! Wires the whole thing together: connects every configured MCP server in
//! order, opens a fresh chat log, runs the read-eval loop, and tears the
//! sessions down in reverse order on every exit path.

mod confirm;
mod session;
mod turn;

pub use confirm::{Approver, AutoApprove, Decision, PendingToolCall, StdinApprover};
pub use session::ReplSession;
pub use turn::{TurnEngine, TurnOutcome};

use std::sync::Arc;

use colored::Colorize;
use eyre::Result;
use tracing::{error, info};

use chatstore::ChatStore;

use crate::config::Config;
use crate::llm::{AnthropicClient, LlmClient};
use crate::mcp::{McpSession, SessionRegistry, ToolDispatcher};

/// Run the interactive REPL
///
/// This is the main entry point for `mr`. Startup aborts if any configured
/// server fails to connect; the servers already connected are closed first.
pub async fn run_interactive(config: &Config, auto_approve: bool, initial_query: Option<String>) -> Result<()> {
    config.validate()?;

    let llm: Arc<dyn LlmClient> = Arc::new(
        AnthropicClient::from_config(&config.llm).map_err(|e| eyre::eyre!("Failed to create LLM client: {}", e))?,
    );

    let store = ChatStore::open(&config.chat.chat_dir)?;
    let log = store.create()?;

    // Connect every configured server, in config order
    let mut registry = SessionRegistry::new();
    for server in &config.servers {
        match McpSession::connect(server).await {
            Ok(session) => registry.push(session),
            Err(e) => {
                // Unwind what we already connected before giving up
                report_close_failures(registry.shutdown().await);
                return Err(eyre::eyre!("Failed to connect to server '{}': {}", server.name, e));
            }
        }
    }
    info!(session_count = registry.len(), "All MCP servers connected");

    let approver: Box<dyn Approver> = if auto_approve {
        Box::new(AutoApprove)
    } else {
        Box::new(StdinApprover)
    };

    let system_prompt = build_system_prompt(config);
    let dispatcher = ToolDispatcher::new(registry);

    let mut session = ReplSession::new(llm, dispatcher, approver, log, system_prompt, config.llm.max_tokens);

    // Shutdown runs whether the loop ended normally or with an error
    let run_result = session.run(initial_query).await;
    report_close_failures(session.shutdown().await);
    run_result
}

fn report_close_failures(failures: Vec<(String, crate::mcp::ConnectionError)>) {
    for (identity, e) in failures {
        error!(identity, error = %e, "Failed to close MCP session");
        eprintln!("{} {}: {}", "Warning: failed to close".yellow(), identity, e);
    }
}

fn build_system_prompt(config: &Config) -> String {
    let mut prompt = String::from(
        "You are a helpful assistant with access to tools provided by connected MCP servers.\n\
         Use the tools when they help answer the query; otherwise answer directly.\n\n\
         Connected servers:\n",
    );
    for server in &config.servers {
        prompt.push_str(&format!("- {}: {}\n", server.name, server.description));
    }
    prompt
}
