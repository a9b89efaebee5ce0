//! Interactive REPL session

use std::sync::Arc;

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::info;

use chatstore::ChatLog;

use crate::llm::LlmClient;
use crate::mcp::{ConnectionError, ToolDispatch, ToolDispatcher};

use super::confirm::Approver;
use super::turn::TurnEngine;

/// Words that end the loop, checked after trimming
const EXIT_KEYWORDS: [&str; 3] = ["quit", "exit", "q"];

/// Interactive REPL session
///
/// Owns the tool dispatcher (and through it every MCP session) and the chat
/// log for the lifetime of the loop. The caller runs the loop and then calls
/// [`ReplSession::shutdown`] exactly once, on every exit path.
pub struct ReplSession {
    llm: Arc<dyn LlmClient>,
    dispatcher: ToolDispatcher,
    approver: Box<dyn Approver>,
    log: ChatLog,
    system_prompt: String,
    max_tokens: u32,
}

impl ReplSession {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        dispatcher: ToolDispatcher,
        approver: Box<dyn Approver>,
        log: ChatLog,
        system_prompt: String,
        max_tokens: u32,
    ) -> Self {
        Self {
            llm,
            dispatcher,
            approver,
            log,
            system_prompt,
            max_tokens,
        }
    }

    /// Run the REPL main loop
    pub async fn run(&mut self, initial_query: Option<String>) -> Result<()> {
        self.print_welcome();

        if let Some(query) = initial_query {
            println!("{} {}", ">".bright_green(), query);
            self.process_query(&query).await;
        }

        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            let readline = rl.readline(&format!("{} ", ">".bright_green()));

            match readline {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }

                    if EXIT_KEYWORDS.contains(&input.to_lowercase().as_str()) {
                        break;
                    }

                    let _ = rl.add_history_entry(input);
                    self.process_query(input).await;
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C while idle - back to the prompt, no side effects
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D - exit
                    println!();
                    break;
                }
                Err(err) => {
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    /// Close every MCP session in reverse connection order
    ///
    /// Returns the close failures paired with the session they belong to.
    pub async fn shutdown(self) -> Vec<(String, ConnectionError)> {
        self.dispatcher.shutdown().await
    }

    /// Run one turn; model call failures abort the turn, not the loop
    async fn process_query(&mut self, query: &str) {
        info!(chat_id = %self.log.chat_id(), "process_query: called");
        let mut engine = TurnEngine::new(
            self.llm.as_ref(),
            &self.dispatcher,
            self.approver.as_ref(),
            &mut self.log,
            &self.system_prompt,
            self.max_tokens,
        );

        if let Err(e) = engine.run_turn(query).await {
            println!("{} {}", "LLM error:".red(), e);
        }
        println!();
    }

    fn print_welcome(&self) {
        let catalog = self.dispatcher.catalog();
        println!();
        println!("{}", "mcprepl".bright_cyan().bold());
        println!(
            "Connected to {} server(s), {} tool(s) available:",
            self.dispatcher.session_count(),
            catalog.len()
        );
        for tool in &catalog {
            println!("  {} {}", tool.name.yellow(), tool.description.dimmed());
        }
        println!("Chat log: {}", self.log.chat_id());
        println!("Type {} to exit", "quit".yellow());
        println!();
    }
}
